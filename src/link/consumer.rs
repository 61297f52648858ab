//! Consumer device-link policy
//!
//! Decides, per linkable target, how it takes part in device linking:
//!
//! | Consumer                         | Finals reached | Result                          |
//! |----------------------------------|----------------|---------------------------------|
//! | device library                   | any            | final device-links all statics  |
//! | target with device sources       | any            | own device-link pass            |
//! | target without device code       | 0              | native link                     |
//! | target without device code       | 1              | links that final directly       |
//! | target without device code       | 2+             | promoted, own device-link pass  |

use super::Engine;
use crate::graph::{
    DeviceCode, DeviceLink, OutputKind, ShadowRefs, TargetId, TargetKind, Visibility,
};
use crate::host::Host;
use crate::propagate;
use crate::resolve::{gather_device_libraries, resolve_final_libraries};
use std::path::PathBuf;
use tracing::{debug, info};

impl<H: Host> Engine<H> {
    /// Recompute the device-link policy of one target
    pub(super) fn refresh(&mut self, id: TargetId) {
        let target = &self.graph[id];
        if let Some(refs) = target.shadows {
            if id == refs.middle {
                self.refresh_library(&refs);
            }
            return;
        }
        if matches!(target.kind, TargetKind::Alias | TargetKind::Interface) || !target.is_linkable()
        {
            return;
        }

        let device_code = target.device_code;
        match device_code {
            DeviceCode::Sources => {
                let inputs = self.device_link_inputs(id);
                self.graph[id].device_link = DeviceLink::Own { inputs };
            }
            DeviceCode::None | DeviceCode::Promoted => self.apply_final_policy(id),
        }
    }

    fn refresh_library(&mut self, refs: &ShadowRefs) {
        let mut inputs = vec![refs.static_lib];
        inputs.extend(self.device_link_inputs(refs.middle));
        self.graph[refs.final_lib].device_link = DeviceLink::Own { inputs };
        self.catch_up(refs);
    }

    /// Static artifacts of every device library reachable from `id`
    fn device_link_inputs(&self, id: TargetId) -> Vec<TargetId> {
        gather_device_libraries(&self.graph, id)
            .into_iter()
            .filter_map(|middle| self.graph[middle].shadows.map(|r| r.static_lib))
            .collect()
    }

    fn apply_final_policy(&mut self, id: TargetId) {
        let finals = resolve_final_libraries(&self.graph, id);
        let name = self.graph.name(id).to_string();

        match finals.as_slice() {
            [] => {
                self.set_promoted(id, false);
                self.graph[id].device_link = DeviceLink::Native;
            }
            [single] => {
                debug!(
                    "`{name}` links final library `{}` directly",
                    self.graph.name(*single)
                );
                self.set_promoted(id, false);
                let bracket = self.graph[id].output == Some(OutputKind::StaticLibrary);
                self.graph[id].device_link = DeviceLink::Final {
                    target: *single,
                    bracket,
                };
            }
            many => {
                let count = many.len();
                info!("`{name}` reaches {count} unrelated final libraries, device-linking itself");
                self.set_promoted(id, true);
                let inputs = self.device_link_inputs(id);
                self.graph[id].device_link = DeviceLink::Own { inputs };
            }
        }
    }

    /// Attach or detach the empty device translation unit
    fn set_promoted(&mut self, id: TargetId, promoted: bool) {
        let empty = PathBuf::from(&self.policy.empty_device_source);
        let target = &mut self.graph[id];
        if promoted {
            target.device_code = DeviceCode::Promoted;
            target.separable = true;
            if !target.sources.contains(&empty) {
                target.sources.push(empty);
            }
        } else if target.is_promoted() {
            target.device_code = DeviceCode::None;
            target.separable = false;
            target.sources.retain(|s| *s != empty);
        }
    }

    /// Copy compile and link requirements of the static shadow onto the
    /// final target, mirroring new values to the host.
    pub(super) fn catch_up(&mut self, refs: &ShadowRefs) {
        let final_name = self.graph.name(refs.final_lib).to_string();
        for (kind, added) in propagate::catch_up_final(&mut self.graph, refs) {
            self.host.declare_property(&final_name, kind, Visibility::Private, &added);
        }
    }
}
