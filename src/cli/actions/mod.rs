mod run;

use crate::exporter::Settings;

/// Action enum representing each possible command
#[derive(Debug)]
pub enum Action {
    Serve { settings: Settings },
}

impl Action {
    /// Execute the action
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails to execute
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
