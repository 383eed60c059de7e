//! # Validation Tier Tests (T0-T6)
//!
//! End-to-end scenarios over the public API. If ANY tier fails, the graph
//! semantics are broken.
//!
//! ## Tiers
//! - T0: Membership & Leaf State
//! - T1: Aggregation Reads
//! - T2: Adoption & Upward Propagation
//! - T3: Multiple Parents
//! - T4: Custom Accessors
//! - T5: Restructuring (supplant, roots)
//! - T6: Load

use composite_core::{
    CompositeError, CompositeGraph, Get, Node, NodeId, NodeTemplate, Notification, Roster,
    Subscription, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

fn piece(weight: i64, horse_power: i64) -> NodeTemplate {
    NodeTemplate::new()
        .field("weight", weight)
        .field("horsePower", horse_power)
}

fn len(graph: &CompositeGraph, node: NodeId, key: &str) -> usize {
    graph.get(node, key).expect("get").len()
}

// =============================================================================
// TIER T0: MEMBERSHIP & LEAF STATE
// =============================================================================

mod t0_membership {
    use super::*;

    /// T0.1: A node is a leaf until it gains a child, and again once the
    /// child is destroyed.
    #[test]
    fn leaf_state_follows_children() {
        let mut graph = CompositeGraph::new();
        let car = graph.create(NodeTemplate::new()).expect("car");
        assert_eq!(graph.is_leaf(car), Some(true));
        assert_eq!(graph.has_children(car), Some(false));

        let part = graph.create(piece(10, 0)).expect("part");
        graph.add_child(car, part).expect("add");
        assert_eq!(graph.is_leaf(car), Some(false));
        assert_eq!(graph.has_children(car), Some(true));

        graph.destroy(part).expect("destroy");
        assert_eq!(graph.is_leaf(car), Some(true));
        assert_eq!(graph.has_children(car), Some(false));
    }

    /// T0.2: Initial parents are wired on creation, both sides.
    #[test]
    fn initial_parents_are_wired() {
        let mut graph = CompositeGraph::new();
        let c2 = graph.create(NodeTemplate::new()).expect("c2");
        let part = || piece(0, 0).composite(["weight", "horsePower"]).parent(c2);
        let p1 = graph.create(part().field("weight", 100)).expect("p1");
        let p2 = graph.create(part().field("weight", 10)).expect("p2");

        for id in [c2, p1, p2] {
            assert_eq!(graph.is_composite_piece(id), Some(true));
        }
        assert!(graph.has_child(c2, p1).expect("has") && graph.has_child(c2, p2).expect("has"));
        assert!(graph.has_parent(p1, c2).expect("has") && graph.has_parent(p2, c2).expect("has"));

        let weight = graph.get(c2, "weight").expect("get");
        assert!(weight.contains(&Value::Int(10)));
        assert!(weight.contains(&Value::Int(100)));
        assert!(graph.node(c2).expect("c2").is_dynamic("weight"));
    }

    /// T0.3: Destroying a child detaches it and shrinks the aggregate.
    #[test]
    fn destroying_a_child() {
        let mut graph = CompositeGraph::new();
        let c2 = graph.create(NodeTemplate::new()).expect("c2");
        let part = || NodeTemplate::new().composite(["weight", "horsePower"]).parent(c2);
        let p1 = graph.create(part().field("weight", 100)).expect("p1");
        let p2 = graph.create(part().field("weight", 10)).expect("p2");

        graph.destroy(p2).expect("destroy");

        assert_eq!(graph.is_composite_piece(p2), None);
        assert_eq!(graph.is_leaf(p2), None);
        assert_eq!(graph.has_children(p2), None);
        assert!(matches!(
            graph.has_parent(p2, c2),
            Err(CompositeError::UseAfterDestroy(_))
        ));
        assert!(!graph.has_child(c2, p2).expect("has"));

        assert_eq!(graph.get(c2, "weight").expect("get"), Value::from(vec![100]));
        assert!(!graph.node(p2).expect("tombstone").is_dynamic("weight"));
        assert_eq!(graph.get(p2, "weight").expect("get"), Value::Int(10));

        graph.destroy(c2).expect("destroy");
        assert!(!graph.has_parent(p1, c2).expect("has"));
        assert_eq!(graph.get(c2, "weight").expect("get"), Value::Null);
    }
}

// =============================================================================
// TIER T1: AGGREGATION READS
// =============================================================================

mod t1_aggregation {
    use super::*;

    /// T1.1: Sums over the composite follow every add and remove.
    #[test]
    fn add_remove_and_operate() {
        let mut graph = CompositeGraph::new();
        let camaro = graph.create(piece(2000, 250)).expect("camaro");
        assert_eq!(graph.sum(camaro, "weight").expect("sum"), 2000);

        let v8 = graph.create(piece(300, 100)).expect("v8");
        let supercharger = graph.create(piece(10, 50)).expect("supercharger");

        graph.add_child(v8, supercharger).expect("add");
        assert_eq!(graph.sum(v8, "weight").expect("sum"), 310);

        graph.add_child(camaro, v8).expect("add");
        assert_eq!(graph.sum(camaro, "weight").expect("sum"), 2310);

        assert!(graph.remove_child(v8, supercharger).expect("remove"));
        assert_eq!(graph.roster(v8, Roster::List).expect("list").len(), 1);
        assert_eq!(graph.sum(v8, "weight").expect("sum"), 300);
        assert_eq!(graph.sum(camaro, "weight").expect("sum"), 2300);

        let seats = graph
            .create(NodeTemplate::new().field("weight", 50).field("horsePower", Value::Null))
            .expect("seats");
        graph.add_child(camaro, seats).expect("add");
        assert_eq!(graph.sum(camaro, "weight").expect("sum"), 2350);
        assert_eq!(graph.sum(camaro, "horsePower").expect("sum"), 350);

        // Bottom-up composition works too.
        let mustang = graph.create(piece(2200, 280)).expect("mustang");
        graph.add_parent(v8, mustang).expect("add");
        assert_eq!(graph.sum(mustang, "weight").expect("sum"), 2500);

        let restrictor = graph.create(piece(30, -50)).expect("restrictor");
        graph.add_parent(restrictor, v8).expect("add");
        assert_eq!(graph.sum(mustang, "horsePower").expect("sum"), 330);
        assert_eq!(graph.sum(camaro, "horsePower").expect("sum"), 300);
    }

    /// T1.2: Leaves read their values verbatim; parents read flat lists.
    #[test]
    fn leaf_values_keep_their_shape() {
        let mut graph = CompositeGraph::new();
        let keys = ["anArray", "aPrimitive"];
        let parent = graph
            .create(
                NodeTemplate::new()
                    .composite(keys)
                    .field("anArray", vec![1])
                    .field("aPrimitive", 1),
            )
            .expect("parent");

        assert_eq!(graph.get(parent, "aPrimitive").expect("get"), Value::Int(1));
        assert!(graph.get(parent, "anArray").expect("get").contains(&Value::Int(1)));

        graph
            .create(
                NodeTemplate::new()
                    .composite(keys)
                    .field("anArray", vec!["d", "e", "f"])
                    .field("aPrimitive", Value::Null)
                    .parent(parent),
            )
            .expect("child");

        graph.set(parent, "aPrimitive", 2).expect("set");
        graph.set(parent, "anArray", vec!["a", "b", "c"]).expect("set");

        assert_eq!(graph.get(parent, "aPrimitive").expect("get"), Value::from(vec![2]));
        assert_eq!(
            graph.get(parent, "anArray").expect("get"),
            Value::from(vec!["a", "b", "c", "d", "e", "f"])
        );
    }

    /// T1.3: Children created with a parent are reachable by operations.
    #[test]
    fn offspring_by_operation() {
        let mut graph = CompositeGraph::new();
        let zeus = graph.create(NodeTemplate::new()).expect("zeus");
        let names = ["Aphrodite", "Orion", "Ares", "Apollo"];
        for name in names {
            graph
                .create(NodeTemplate::new().field("name", name).parent(zeus))
                .expect("child");
        }

        let offspring = graph.do_composite_operation(zeus, &Get, "name").expect("op");
        let expected: Vec<Value> = names.iter().map(|n| Value::from(*n)).collect();
        assert_eq!(offspring, expected);
    }

    /// T1.4: Plain nodes without any declarations still contribute.
    #[test]
    fn undeclared_children_contribute() {
        let mut graph = CompositeGraph::new();
        let veyron = graph.create(piece(1000, 500)).expect("veyron");
        let extra = graph.create(piece(100, 50)).expect("extra");
        graph.add_child(veyron, extra).expect("add");

        assert_eq!(graph.sum(veyron, "weight").expect("sum"), 1100);
    }
}

// =============================================================================
// TIER T2: ADOPTION & UPWARD PROPAGATION
// =============================================================================

mod t2_propagation {
    use super::*;
    use composite_core::Constant;

    /// T2.1: Changes deep in a forest percolate up, settled per batch.
    #[test]
    fn forest_of_leaves() {
        let mut graph = CompositeGraph::new();
        let forest = graph.create(NodeTemplate::new().field("name", "forest")).expect("forest");

        let fired = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&fired);
        graph.subscribe(
            Subscription::Property {
                node: forest,
                key: "leaves".to_string(),
            },
            move |_| *sink.borrow_mut() += 1,
        );

        let tree = NodeTemplate::new()
            .composite(["leaves"])
            .accessor("branches", Constant(Value::Int(1)))
            .parent(forest);

        graph.begin_batch();
        let tree1 = graph.create(tree.clone().field("leaves", 100)).expect("tree1");
        let tree2 = graph.create(tree.field("leaves", 20)).expect("tree2");
        let changes = graph.end_batch();
        assert!(changes.property_changed(forest, "leaves"));
        assert_eq!(*fired.borrow(), 1);

        assert!(graph.node(tree1).expect("tree1").is_composite("branches"));
        assert_eq!(graph.sum(forest, "branches").expect("sum"), 2);
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 120);
        let leaves = graph.get(forest, "leaves").expect("get");
        assert!(leaves.contains(&Value::Int(20)) && leaves.contains(&Value::Int(100)));

        graph
            .batch(|g| {
                g.set(tree1, "leaves", 150)?;
                g.set(tree2, "leaves", 50)
            })
            .expect("batch");
        assert_eq!(*fired.borrow(), 2);
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 200);

        let branch = NodeTemplate::new().composite(["leaves"]);
        graph
            .create(branch.clone().field("leaves", 1000).parent(tree1))
            .expect("branch1");
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 1200);

        let ((_, branch3), _) = graph
            .batch(|g| {
                let b2 = g.create(branch.clone().field("leaves", 200).parent(tree2))?;
                let b3 = g.create(branch.clone().field("leaves", 400).parent(tree2))?;
                Ok((b2, b3))
            })
            .expect("batch");
        assert_eq!(graph.sum(tree1, "leaves").expect("sum"), 1150);
        assert_eq!(graph.sum(tree2, "leaves").expect("sum"), 650);
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 1800);

        graph.set(branch3, "leaves", 600).expect("set");
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 2000);

        graph.remove_child(tree2, branch3).expect("remove");
        assert!(!graph.has_child(tree2, branch3).expect("has"));
        assert_eq!(graph.sum(forest, "leaves").expect("sum"), 1400);
        assert_eq!(*fired.borrow(), 6);
    }

    /// T2.2: The combined roster is observable.
    #[test]
    fn composite_list_is_observable() {
        let mut graph = CompositeGraph::new();
        let soapbox = graph.create(piece(5, 0)).expect("soapbox");
        let part = graph.create(NodeTemplate::new().field("weight", 5)).expect("part");

        let seen: Rc<RefCell<Vec<Notification>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph.subscribe(
            Subscription::Roster {
                node: soapbox,
                roster: Roster::List,
            },
            move |n| sink.borrow_mut().push(n.clone()),
        );

        graph.add_child(soapbox, part).expect("add");
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(graph.roster(soapbox, Roster::Children).expect("roster").len(), 1);

        graph.remove_child(soapbox, part).expect("remove");
        assert_eq!(seen.borrow().len(), 2);
        assert!(graph.roster(soapbox, Roster::Children).expect("roster").is_empty());
    }

    /// T2.3: A write notifies the writer and every aggregating ancestor once.
    #[test]
    fn write_notifies_chain_once() {
        let mut graph = CompositeGraph::new();
        let root = graph.create(NodeTemplate::new()).expect("root");
        let mid = graph.create(NodeTemplate::new().parent(root)).expect("mid");
        let leaf = graph
            .create(NodeTemplate::new().composite(["p"]).field("p", 1).parent(mid))
            .expect("leaf");

        let ((), changes) = graph.batch(|g| g.set(leaf, "p", 2)).expect("batch");

        assert_eq!(changes.len(), 3);
        for id in [root, mid, leaf] {
            assert_eq!(changes.property_changes(id, "p"), 1);
        }
    }
}

// =============================================================================
// TIER T3: MULTIPLE PARENTS
// =============================================================================

mod t3_multiple_parents {
    use super::*;

    fn characters(names: &[&str]) -> Value {
        Value::from(names.to_vec())
    }

    /// T3.1: One piece aggregates into every parent independently.
    #[test]
    fn delorean_across_years() {
        let mut graph = CompositeGraph::new();
        let y1985 = graph.create(NodeTemplate::new().field("year", "1985")).expect("1985");
        let y1955 = graph.create(NodeTemplate::new().field("year", "1955")).expect("1955");
        let y1885 = graph.create(NodeTemplate::new().field("year", "1885")).expect("1885");

        let delorean = graph
            .create(
                NodeTemplate::new()
                    .composite(["characters"])
                    .parents([y1985, y1955, y1885]),
            )
            .expect("delorean");
        graph
            .set(delorean, "characters", characters(&["Marty McFly", "Doc Brown"]))
            .expect("set");

        for year in [y1985, y1955, y1885] {
            assert_eq!(len(&graph, year, "characters"), 2);
        }

        graph
            .set(
                y1955,
                "characters",
                characters(&[
                    "Martys Teen Mom",
                    "BTTF 1: Marty McFly",
                    "BTTF 1: Doc Brown",
                    "Young Biff",
                    "Old Biff from the Future",
                ]),
            )
            .expect("set");
        graph
            .set(y1885, "characters", characters(&["Clara Clayton", "Maddog Tannen"]))
            .expect("set");

        assert_eq!(len(&graph, y1985, "characters"), 2);
        assert_eq!(len(&graph, y1955, "characters"), 7);
        assert_eq!(len(&graph, y1885, "characters"), 4);

        graph
            .create(
                NodeTemplate::new()
                    .composite(["characters"])
                    .parents([y1985, y1885])
                    .field(
                        "characters",
                        characters(&["Wild West Doc Brown", "Mrs. Clara Brown"]),
                    ),
            )
            .expect("time train");

        assert_eq!(len(&graph, y1985, "characters"), 4);
        assert_eq!(len(&graph, y1955, "characters"), 7);
        assert_eq!(len(&graph, y1885, "characters"), 6);

        graph.remove_child(y1885, delorean).expect("remove");

        assert_eq!(len(&graph, y1985, "characters"), 4);
        assert_eq!(len(&graph, y1955, "characters"), 7);
        assert_eq!(len(&graph, y1885, "characters"), 4);
        assert_eq!(len(&graph, delorean, "characters"), 2);
    }

    /// T3.2: Parent rosters are editable through handles and wholesale.
    #[test]
    fn editing_parent_roster() {
        let mut graph = CompositeGraph::new();
        let y1985 = graph.create(NodeTemplate::new()).expect("1985");
        let y1955 = graph.create(NodeTemplate::new()).expect("1955");
        let delorean = graph
            .create(NodeTemplate::new().composite(["characters"]))
            .expect("delorean");
        graph
            .set(delorean, "characters", characters(&["Marty McFly", "Doc Brown"]))
            .expect("set");

        graph
            .roster_mut(delorean, Roster::Parents)
            .push(y1985)
            .expect("push");
        assert_eq!(len(&graph, y1985, "characters"), 2);

        graph.set_parents(delorean, [y1985, y1955]).expect("set");
        assert_eq!(len(&graph, y1985, "characters"), 2);
        assert_eq!(len(&graph, y1955, "characters"), 2);
    }

    /// T3.3: Each path through a diamond contributes.
    #[test]
    fn diamond_counts_each_path() {
        let mut graph = CompositeGraph::new();
        let apex = graph.create(NodeTemplate::new()).expect("apex");
        let left = graph.create(NodeTemplate::new().parent(apex)).expect("left");
        let right = graph.create(NodeTemplate::new().parent(apex)).expect("right");
        graph
            .create(NodeTemplate::new().field("n", 5).parents([left, right]))
            .expect("leaf");

        assert_eq!(graph.sum(apex, "n").expect("sum"), 10);
    }
}

// =============================================================================
// TIER T4: CUSTOM ACCESSORS
// =============================================================================

mod t4_accessors {
    use super::*;
    use composite_core::PropertyAccessor;

    /// Boxed items first, then everything ever loaded; loading appends.
    #[derive(Debug)]
    struct TruckCargo;

    impl PropertyAccessor for TruckCargo {
        fn get(&self, node: &Node, stored: &Value) -> Value {
            let mut items = node.raw("boxedItems").to_items();
            items.extend(stored.to_items());
            Value::List(items)
        }

        fn set(&self, _node: &Node, stored: &Value, incoming: Value) -> Value {
            let mut items = stored.to_items();
            items.extend(incoming.to_items());
            Value::List(items)
        }
    }

    /// T4.1: Accessor setters keep their semantics while aggregating.
    #[test]
    fn truck_cargo_appends() {
        let mut graph = CompositeGraph::new();
        let truck = graph
            .create(NodeTemplate::new().accessor("cargo", TruckCargo))
            .expect("truck");

        graph
            .set(truck, "cargo", vec!["marbles", "dice", "tacks", "nails"])
            .expect("set");
        graph
            .set(truck, "boxedItems", vec!["mousetraps", "acme anvils", "exploding cigars"])
            .expect("set");
        assert_eq!(len(&graph, truck, "cargo"), 7);

        graph
            .create(
                NodeTemplate::new()
                    .composite(["cargo"])
                    .field(
                        "cargo",
                        vec![
                            "Back to the Future: Trilogy",
                            "Star Wars: The Empire Strikes Back",
                            "Total Recall",
                        ],
                    )
                    .parent(truck),
            )
            .expect("bag");
        assert_eq!(len(&graph, truck, "cargo"), 10);

        graph
            .set(truck, "cargo", vec!["snowboard", "parachute", "crampons"])
            .expect("set");
        assert_eq!(len(&graph, truck, "cargo"), 13);
    }
}

// =============================================================================
// TIER T5: RESTRUCTURING
// =============================================================================

mod t5_restructuring {
    use super::*;

    fn camaro_with_engine(graph: &mut CompositeGraph) -> (NodeId, NodeId, NodeId) {
        let camaro = graph.create(piece(2000, 250)).expect("camaro");
        let v8 = graph.create(piece(300, 100).parent(camaro)).expect("v8");
        let supercharger = graph.create(piece(10, 50).parent(v8)).expect("supercharger");
        (camaro, v8, supercharger)
    }

    /// T5.1: Every piece of a single-rooted composite reports the same root.
    #[test]
    fn composite_root() {
        let mut graph = CompositeGraph::new();
        let (camaro, v8, supercharger) = camaro_with_engine(&mut graph);

        for id in [camaro, v8, supercharger] {
            assert_eq!(graph.composite_root(id).expect("root"), vec![camaro]);
        }
    }

    /// T5.2: Supplanting transfers the whole subtree.
    #[test]
    fn supplant() {
        let mut graph = CompositeGraph::new();
        let (camaro, v8, _) = camaro_with_engine(&mut graph);
        let camaro2011 = graph.create(piece(1000, 300)).expect("camaro2011");

        assert_eq!(graph.sum(camaro, "horsePower").expect("sum"), 400);
        assert_eq!(graph.sum(camaro2011, "horsePower").expect("sum"), 300);

        graph.supplant(camaro2011, camaro).expect("supplant");

        assert_eq!(graph.sum(camaro2011, "horsePower").expect("sum"), 450);
        assert_eq!(graph.sum(camaro, "horsePower").expect("sum"), 250);
        assert_eq!(graph.has_children(camaro), Some(false));
        assert_eq!(graph.roster(v8, Roster::Parents).expect("roster").len(), 1);
    }
}

// =============================================================================
// TIER T6: LOAD
// =============================================================================

mod t6_load {
    use super::*;

    /// T6.1: A forest of a thousand leaves adopts every key and sums exactly.
    #[test]
    fn aggregating_forest() {
        const BRANCHES: usize = 10;
        const LEAVES: usize = 100;

        let mut graph = CompositeGraph::new();
        let forest = graph
            .create(NodeTemplate::new().composite(["trees"]))
            .expect("forest");

        let mut expected = 0i64;
        let ((), _) = graph
            .batch(|g| {
                let tree = g.create(NodeTemplate::new().composite(["branches"]).parent(forest))?;
                for b in 0..BRANCHES {
                    let branch =
                        g.create(NodeTemplate::new().composite(["leaves"]).parent(tree))?;
                    for l in 0..LEAVES {
                        let stomata = ((b * LEAVES + l) * 37 % 100) as i64;
                        expected += stomata;
                        g.create(
                            NodeTemplate::new()
                                .composite(["stomata"])
                                .field("stomata", stomata)
                                .parent(branch),
                        )?;
                    }
                }
                Ok(())
            })
            .expect("build");

        assert_eq!(graph.len(), 1 + 1 + BRANCHES + BRANCHES * LEAVES);
        assert_eq!(graph.sum(forest, "stomata").expect("sum"), expected);
        assert_eq!(len(&graph, forest, "stomata"), BRANCHES * LEAVES);

        let adopted: Vec<&str> = graph.node(forest).expect("forest").composite_properties().collect();
        assert_eq!(adopted, vec!["branches", "leaves", "stomata", "trees"]);
    }
}
