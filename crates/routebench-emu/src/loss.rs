//! Loss application via `tc netem`.

use std::io;

use crate::netns::NodeNs;

/// Apply a loss percentage to one interface inside a namespace.
///
/// Any existing root qdisc is removed first so repeated updates replace
/// rather than stack. The value is clamped to the 0–100 range netem
/// accepts; callers use small residual values rather than exactly zero
/// for repaired links, so the qdisc is always present once installed.
pub fn set_interface_loss(ns: &NodeNs, interface: &str, loss_percent: f64) -> io::Result<()> {
    let _ = ns.exec("tc", &["qdisc", "del", "dev", interface, "root"]);

    let loss = format!("{}%", loss_percent.clamp(0.0, 100.0));
    let output = ns.exec(
        "tc",
        &["qdisc", "add", "dev", interface, "root", "netem", "loss", &loss],
    )?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "tc netem loss {loss} on {interface}: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}
