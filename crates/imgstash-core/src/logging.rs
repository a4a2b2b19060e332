use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::{Error, Result};

/// Install a global `tracing` subscriber for hosts that have none.
///
/// Verbose mode logs every URL at DEBUG; otherwise only session summaries
/// and failures are shown. Fails if a global subscriber is already set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to install log subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Other tests in this binary never install a global subscriber.
        let first = init_logging(true);
        let second = init_logging(false);

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::Other(_))));
    }
}
