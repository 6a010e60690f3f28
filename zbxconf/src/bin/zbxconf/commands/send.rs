use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use zbxconf::sender::{self, Metric};

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Send Values",
    commands: &[
        "zbxconf send circus.numprocesses 4 --host web-1          # Push one value",
        "zbxconf send app.ping 1 --server 10.0.0.5:10051         # Override the trapper address",
    ],
}];

#[derive(Args)]
pub struct SendArgs {
    /// Item key
    pub key: String,

    /// Value to push
    pub value: String,

    /// Host the item belongs to (defaults to localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// Trapper address, overriding [sender] server
    #[arg(long)]
    pub server: Option<String>,

    /// Connect and I/O timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

pub fn handle_send(args: SendArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let server = match args.server {
        Some(server) => server,
        None => ctx.sender_server()?,
    };
    let mut metric = Metric::new(args.key, args.value);
    if let Some(host) = args.host {
        metric = metric.host(host);
    }

    output.verbose(&format!("Connecting to {server}"));
    let timeout = Duration::from_secs(args.timeout);
    let mut stream = TcpStream::connect(&server).with_context(|| format!("Failed to connect to {server}"))?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let info = sender::send(&mut stream, &[metric]).context("Sending failed")?;
    output.success(info.as_deref().unwrap_or("Value accepted"));
    Ok(())
}
