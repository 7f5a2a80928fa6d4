use axum::Router;
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// HTTP surface for the preferences UI: settings, live stats, status.
pub struct ControlHost;

impl ControlHost {
    pub async fn start(requested_port: u16, app_router: Router) -> anyhow::Result<()> {
        // Bind to Port (0 for dynamic)
        let addr = SocketAddr::from(([127, 0, 0, 1], requested_port));
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Control host listening on http://{}", local_addr);

        axum::serve(listener, app_router).await?;

        Ok(())
    }
}
