//! Linux network namespace primitives for emulated nodes.

use std::io;
use std::process::{Command, Output};

/// A Linux network namespace managed via `ip netns`, standing in for one
/// experiment node.
///
/// Created on construction (recreated if a leftover with the same name
/// exists), loopback brought up, and deleted again on drop so an aborted
/// run does not leak namespaces.
#[derive(Debug)]
pub struct NodeNs {
    pub name: String,
}

impl NodeNs {
    pub fn create(name: &str) -> io::Result<Self> {
        // Remove any stale namespace from a previous run
        let _ = host(&["ip", "netns", "del", name]);

        checked("create netns", host(&["ip", "netns", "add", name])?)?;
        let _ = Command::new("sudo")
            .args(["ip", "netns", "exec", name, "ip", "link", "set", "lo", "up"])
            .output();

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Run a command inside the namespace.
    pub fn exec(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        Command::new("sudo")
            .args(["ip", "netns", "exec", &self.name, cmd])
            .args(args)
            .output()
    }

    /// Wire a veth pair between this namespace and `peer`, assign the
    /// given addresses (CIDR notation), and bring both ends up.
    pub fn connect(
        &self,
        peer: &NodeNs,
        local_if: &str,
        peer_if: &str,
        local_addr: &str,
        peer_addr: &str,
    ) -> io::Result<()> {
        // Leftover host-side veths would make `ip link add` fail
        let _ = host(&["ip", "link", "del", local_if]);

        checked(
            "create veth pair",
            host(&[
                "ip", "link", "add", local_if, "type", "veth", "peer", "name", peer_if,
            ])?,
        )?;
        checked(
            "move local veth",
            host(&["ip", "link", "set", local_if, "netns", &self.name])?,
        )?;
        checked(
            "move peer veth",
            host(&["ip", "link", "set", peer_if, "netns", &peer.name])?,
        )?;

        checked(
            "assign local address",
            self.exec("ip", &["addr", "add", local_addr, "dev", local_if])?,
        )?;
        checked(
            "bring local end up",
            self.exec("ip", &["link", "set", local_if, "up"])?,
        )?;
        checked(
            "assign peer address",
            peer.exec("ip", &["addr", "add", peer_addr, "dev", peer_if])?,
        )?;
        checked(
            "bring peer end up",
            peer.exec("ip", &["link", "set", peer_if, "up"])?,
        )?;

        Ok(())
    }
}

impl Drop for NodeNs {
    fn drop(&mut self) {
        let _ = Command::new("sudo")
            .args(["ip", "netns", "del", &self.name])
            .status();
    }
}

fn host(args: &[&str]) -> io::Result<Output> {
    Command::new("sudo").args(args).output()
}

fn checked(what: &str, output: Output) -> io::Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "{what}: {}",
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}
