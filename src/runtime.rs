//! The "Main instance" facade (spec §9 Design Notes): a constructed
//! `Runtime` that owns the hub, the object tree, the query manager, the
//! resetter registry, and the dispatcher, and threads them explicitly into
//! every subsystem instead of relying on global singletons.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sw_channel::{Channel, Role};
use sw_hub::{ChannelId, Hub};
use sw_objects::{NodeInfo, Registry, Tree};
use sw_query::{ExpiryHook, QueryManager};
use sw_resetter::{ResetMode, Resetter};
use sw_util::ReportError;
use uuid::Uuid;

use crate::config::NodeConfig;
use crate::dispatcher::Dispatcher;
use crate::periodic::PeriodicRunner;

struct ExpiryReporter {
    reporter: Arc<dyn ReportError>,
}

impl ExpiryHook for ExpiryReporter {
    fn on_expire(&self, query_id: u16) {
        self.reporter.report_error(sw_util::ErrorKind::QueryExpired, &format!("query {query_id} expired"), "", false);
    }
}

/// Owns every subsystem for one running node.
pub struct Runtime {
    config: NodeConfig,
    tree: Arc<Tree>,
    hub: Arc<Hub>,
    query_manager: Arc<QueryManager>,
    resetters: RwLock<HashMap<String, Arc<Resetter>>>,
    dispatcher: Dispatcher,
    periodic: PeriodicRunner,
    reporter: Arc<dyn ReportError>,
}

impl Runtime {
    pub fn new(config: NodeConfig, registry: Registry, reporter: Arc<dyn ReportError>) -> Arc<Self> {
        let self_info = NodeInfo {
            uuid: config.uuid,
            name: config.name.clone(),
            version: config.version.clone(),
            core_version: config.core_version.clone(),
            remote_address: None,
            user_label: config.user_label.clone(),
            app_params: HashMap::new(),
        };

        let tree = Arc::new(Tree::new(registry, config.uuid));
        let hub = Arc::new(Hub::new(self_info, config.lossless_dir.clone()));
        let query_manager = QueryManager::new(Arc::new(ExpiryReporter { reporter: reporter.clone() }));
        let dispatcher = Dispatcher::start(num_cpus_hint(), 4096);
        let periodic = PeriodicRunner::start(std::time::Duration::from_secs(config.tuning.periodic_interval_secs));

        Arc::new(Runtime {
            config,
            tree,
            hub,
            query_manager,
            resetters: RwLock::new(HashMap::new()),
            dispatcher,
            periodic,
            reporter,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn self_uuid(&self) -> Uuid {
        self.config.uuid
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    pub fn query_manager(&self) -> &Arc<QueryManager> {
        &self.query_manager
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn periodic(&self) -> &PeriodicRunner {
        &self.periodic
    }

    pub fn reporter(&self) -> &Arc<dyn ReportError> {
        &self.reporter
    }

    /// Lazily create (or fetch) the per-`ObjectCode` resetter, using the
    /// configured default capacity and pump rate.
    pub fn resetter_for(&self, object_code: &str, mode: ResetMode) -> Arc<Resetter> {
        if let Some(resetter) = self.resetters.read().unwrap().get(object_code) {
            return resetter.clone();
        }
        let mut resetters = self.resetters.write().unwrap();
        if let Some(resetter) = resetters.get(object_code) {
            return resetter.clone();
        }
        let resetter =
            Arc::new(Resetter::with_params(mode, self.config.tuning.resetter_capacity, self.config.tuning.resetter_pump_rate_per_min));
        resetters.insert(object_code.to_owned(), resetter.clone());
        resetter
    }

    pub fn add_channel(&self, channel: Arc<dyn Channel>, role: Role) -> ChannelId {
        self.hub.add_channel(channel, role)
    }
}

/// A conservative, dependency-free worker-count guess for the dispatcher
/// pool: scale with available parallelism, bounded so a single-core CI
/// runner doesn't starve itself.
fn num_cpus_hint() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4).clamp(2, 16)
}
