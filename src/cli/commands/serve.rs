//! Extraction server command.

use std::net::SocketAddr;

use console::style;

use crate::config::Config;

/// Start the extraction server.
pub async fn cmd_serve(mut config: Config, bind: Option<&str>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = parse_bind_address(bind)?.to_string();
    }
    config.validate()?;
    let addr = config.server.bind_addr()?;

    println!(
        "{} Starting pageocr server at http://{} ({} backend, {} engine(s))",
        style("→").cyan(),
        addr,
        config.ocr.backend,
        config.ocr.pool_size
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(&config, addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<SocketAddr> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(SocketAddr::from(([127, 0, 0, 1], port)));
    }
    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok(addr);
    }
    format!("{}:3030", bind)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind, e))
}
