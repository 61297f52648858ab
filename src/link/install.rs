use super::Engine;
use crate::diagnostics::BuildError;
use crate::host::Host;
use indexmap::IndexSet;
use tracing::debug;

impl<H: Host> Engine<H> {
    /// Declare installation of the named targets.
    ///
    /// A device library installs every artifact a downstream project links:
    /// the static shadow, the middle library and the final library. Object
    /// libraries are never installed. Returns the installed target names.
    pub fn install(&mut self, targets: &[&str]) -> Result<Vec<String>, BuildError> {
        let mut names = IndexSet::new();
        for &name in targets {
            let id = self.resolve(name)?;
            match self.graph[id].shadows {
                Some(refs) => {
                    debug!("installing device library `{name}` as its shadow artifacts");
                    names.extend(
                        refs.artifacts()
                            .into_iter()
                            .map(|a| self.graph.name(a).to_string()),
                    );
                }
                None => {
                    names.insert(name.to_string());
                }
            }
        }

        let names: Vec<String> = names.into_iter().collect();
        self.host.declare_install(&names);
        Ok(names)
    }
}
