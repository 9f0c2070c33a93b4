use crate::layout::LayoutConfig;

use super::super::ViewModel;

impl ViewModel {
    /// Restarts the layout when the store's topology moved since the last
    /// run. Selection and record changes leave the simulation alone.
    pub(in crate::app) fn sync_layout(&mut self) {
        let topology = self.store.revisions().topology;
        if self.layout_revision == Some(topology) {
            return;
        }

        let state = self.store.state();
        self.layout.restart(state.nodes(), state.links());
        self.layout_revision = Some(topology);
        self.search_match_cache = None;

        if let Some(node) = self.gesture.dragged_node()
            && !state.contains_node(node)
        {
            self.gesture = Default::default();
        }
    }

    pub(in crate::app) fn apply_layout_config(&mut self, config: LayoutConfig) {
        if config == self.layout.config() {
            return;
        }

        self.layout.set_config(config);
        self.layout_revision = None;
    }
}
