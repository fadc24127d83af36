//! Keep the list fresh on the refresh timer until interrupted.

use crate::config::Config;
use crate::output;
use berez_state::TickReport;
use log::{error, info};

/// Print a line per refresh cycle. Stops after `ticks` cycles when given,
/// otherwise on Ctrl-C.
pub async fn run_watch(config: &Config, ticks: Option<usize>) -> anyhow::Result<()> {
    let (session, _client) = config.open_session(None)?;
    let mut events = session.resolver().subscribe();
    let mut reports = session.start();
    let mut seen = 0;

    loop {
        tokio::select! {
            report = reports.recv() => {
                let Some(report) = report else { break };
                output::drain_warnings(&mut events);
                match &report {
                    TickReport::Refreshed { .. } => {
                        println!("{}", output::describe_report(&report));
                        output::print_rows(&session.rows());
                    }
                    TickReport::Superseded => info!("{}", output::describe_report(&report)),
                    _ => error!("{}", output::describe_report(&report)),
                }
                seen += 1;
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    session.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::config_for;

    #[tokio::test]
    async fn stops_after_the_requested_ticks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fountains/34.7818,32.0853")
            .with_body(r#"{"items": []}"#)
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&server, &dir.path().join("prefs.json"));

        tokio::task::LocalSet::new()
            .run_until(run_watch(&config, Some(1)))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
