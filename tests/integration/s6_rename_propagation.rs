//! S6: `rename("b")` on the producer's tree leaves the old id "a"
//! unreachable (obsolete) while a live successor object carries the new
//! id and the same field state, matching what a consumer's `onRename`
//! handler would observe after replaying the same sequence of operations.

use sw_objects::{DataObject, NodeId, Registry, Tree};
use sw_wire::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Car {
    speed: i64,
}

impl DataObject for Car {
    fn object_code(&self) -> &'static str {
        "Car"
    }

    fn parent_code(&self) -> Option<&'static str> {
        None
    }

    fn fields(&self) -> Vec<(String, Value)> {
        vec![("speed".to_string(), Value::Int(self.speed))]
    }

    fn apply_fields(&mut self, fields: Vec<(String, Value)>) {
        for (name, value) in fields {
            if name == "speed" {
                if let Value::Int(n) = value {
                    self.speed = n;
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn DataObject> {
        Box::new(self.clone())
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register("Car", || Box::new(Car { speed: 0 }));
    registry
}

#[test]
fn rename_leaves_old_id_obsolete_and_carries_state_to_new_id() {
    let tree = Tree::new(registry(), Uuid::new_v4());
    let original = tree.create_top_level_object("Car", "a").unwrap();
    tree.apply_fields(original, vec![("speed".to_string(), Value::Int(42))]).unwrap();

    let (obsolete, renamed) = tree.rename(original, "b").unwrap();

    assert_eq!(obsolete, original);
    assert!(tree.is_obsolete(obsolete), "the old id must become unreachable after rename");
    assert!(!tree.is_obsolete(renamed));

    // The surviving instance carries forward the field state set before
    // the rename (what `commit`/replay on a consumer would reproduce).
    let fields = tree.fields(renamed).unwrap();
    assert_eq!(fields, vec![("speed".to_string(), Value::Int(42))]);

    // "a" cannot be recreated as a live sibling while the obsolete record
    // still occupies the slot's history, but a fresh object under a brand
    // new id works normally, proving the tree isn't stuck.
    let other = tree.create_top_level_object("Car", "c").unwrap();
    assert!(!tree.is_obsolete(other));

    // Both the renamed survivor and the unrelated new object are visible
    // as live children of the root.
    let live_children = tree.get_filtered_children(NodeId::ROOT, Some("Car"), &mut |_| true);
    assert_eq!(live_children.len(), 2);
    assert!(live_children.contains(&renamed));
    assert!(live_children.contains(&other));
}
