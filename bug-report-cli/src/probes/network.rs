//! Networking: addresses, firewall, listening sockets, DNS, netplan

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const CATEGORY: Category = Category::Networking;

const IP_ADDR: Artifact<'static> = Artifact::new(CATEGORY, "ip-addr.txt", "network interface");
const IPTABLES: Artifact<'static> = Artifact::new(CATEGORY, "iptables.txt", "firewall");
const SOCKETS: Artifact<'static> = Artifact::new(CATEGORY, "ss.txt", "listening socket");
const RESOLVER: Artifact<'static> = Artifact::new(CATEGORY, "resolvectl.txt", "DNS resolver");
const NETPLAN: Artifact<'static> = Artifact::new(CATEGORY, "netplan.txt", "netplan");

pub struct NetworkProbe;

impl Probe for NetworkProbe {
    fn name(&self) -> &'static str {
        "networking"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        vec![
            capture::command(ctx, &IP_ADDR, &Invocation::new("ip").arg("addr")),
            capture::command(
                ctx,
                &IPTABLES,
                &Invocation::new("iptables").args(["-L", "-n", "-v"]).privileged(),
            ),
            // -p needs root to name processes owned by other users
            capture::command(
                ctx,
                &SOCKETS,
                &Invocation::new("ss").arg("-tulpn").privileged(),
            ),
            capture::command(ctx, &RESOLVER, &Invocation::new("resolvectl").arg("status")),
            capture::concat(ctx, &NETPLAN, &["/etc/netplan"]),
        ]
    }
}
