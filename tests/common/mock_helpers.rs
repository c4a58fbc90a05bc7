//! Mock construction helpers

use crossbeam_channel::Receiver;
use homeflow::catalog::ModuleRepository;
use homeflow::graph::{event_channel, Graph, GraphEvent};
use homeflow::types::{ModuleTemplate, Sensor};

mockall::mock! {
    pub Repo {}

    impl ModuleRepository for Repo {
        fn lookup_module(&self, global_id: &str) -> Option<ModuleTemplate>;
        fn lookup_sensor(&self, template: &str) -> Option<Sensor>;
    }
}

/// An empty graph wired to an event receiver
pub fn observed_graph() -> (Graph, Receiver<GraphEvent>) {
    let (tx, rx) = event_channel();
    (Graph::new().with_event_sink(tx), rx)
}

/// Every event received so far
pub fn drain(rx: &Receiver<GraphEvent>) -> Vec<GraphEvent> {
    rx.try_iter().collect()
}
