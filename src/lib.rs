//! Spiderwiz: an embeddable peer-to-peer object-propagation runtime. A
//! `Runtime` wires together the data-object tree (`sw_objects`), the wire
//! codec (`sw_wire`), per-channel sequencing (`sw_sequencer`), the mesh hub
//! (`sw_hub`), the lossless pipe (`sw_lossless`), the resetter
//! (`sw_resetter`), and the query layer (`sw_query`) behind one facade.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod periodic;
pub mod runtime;

pub use config::{ConfigError, NodeConfig, TuningConfig};
pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, ReportError, RuntimeError, TracingReporter};
pub use periodic::PeriodicRunner;
pub use runtime::Runtime;

pub use sw_channel as channel;
pub use sw_hub as hub;
pub use sw_lossless as lossless;
pub use sw_objects as objects;
pub use sw_query as query;
pub use sw_resetter as resetter;
pub use sw_sequencer as sequencer;
pub use sw_wire as wire;
