//! taskdeck serve command implementation.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::server::{self, StaticSite};

pub struct ServeOptions {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub static_dir: Option<PathBuf>,
}

pub fn run(ctx: &Context, options: ServeOptions) -> Result<()> {
    let server_config = &ctx.config.server;
    let host = options
        .host
        .unwrap_or_else(|| server_config.host.clone());
    let port = options.port.unwrap_or(server_config.port);
    let addr = listen_addr(&host, port)?;

    let static_dir = options
        .static_dir
        .unwrap_or_else(|| server_config.static_dir.clone());
    let site = StaticSite::new(static_dir, &server_config.api_prefix)?;

    let quiet = ctx.quiet;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = server::bind(addr).await?;
        let local = listener.local_addr()?;
        tracing::info!(root = %site.root().display(), "serving on http://{local}");
        if !quiet {
            eprintln!("taskdeck: serving {} on http://{local}", site.root().display());
        }
        server::run(listener, site, server::shutdown_signal()).await
    })
}

fn listen_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let host = host.trim();
    (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| Error::InvalidArgument(format!("invalid listen host '{host}'")))
}
