//! Overlapping subnets between connected clusters

use crate::crd::Endpoint;
use crate::reporter::Reporter;
use ipnet::IpNet;
use kube::ResourceExt;

/// True if two networks share any address
pub fn overlaps(a: &IpNet, b: &IpNet) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

struct ParsedEndpoint<'a> {
    name: String,
    cluster_id: &'a str,
    subnets: Vec<(&'a str, IpNet)>,
}

/// Compare the subnets of every pair of endpoints.
///
/// Returns true if no failure was queued.
pub fn evaluate_overlapping_cidrs(endpoints: &[Endpoint], status: &mut Reporter) -> bool {
    let mut failed = false;

    let parsed: Vec<ParsedEndpoint> = endpoints
        .iter()
        .map(|ep| {
            let name = ep.name_any();
            let mut subnets = Vec::new();
            for subnet in &ep.spec.subnets {
                match subnet.parse::<IpNet>() {
                    Ok(net) => subnets.push((subnet.as_str(), net)),
                    Err(e) => {
                        failed = true;
                        status.queue_failure(format!(
                            "Endpoint {:?} reports an invalid subnet {:?}: {}",
                            name, subnet, e
                        ));
                    }
                }
            }
            ParsedEndpoint {
                name,
                cluster_id: ep.spec.cluster_id.as_str(),
                subnets,
            }
        })
        .collect();

    for (i, a) in parsed.iter().enumerate() {
        for b in &parsed[i + 1..] {
            if a.cluster_id == b.cluster_id {
                failed = true;
                status.queue_failure(format!(
                    "Found multiple endpoints for cluster {:?}: {:?} and {:?}",
                    a.cluster_id, a.name, b.name
                ));
                continue;
            }

            for (cidr, net) in &a.subnets {
                if b.subnets.iter().any(|(_, other)| overlaps(net, other)) {
                    failed = true;
                    let theirs: Vec<&str> = b.subnets.iter().map(|(s, _)| *s).collect();
                    status.queue_failure(format!(
                        "CIDR {:?} in cluster {:?} overlaps with cluster {:?} (CIDRs: {})",
                        cidr,
                        a.cluster_id,
                        b.cluster_id,
                        theirs.join(", ")
                    ));
                }
            }
        }
    }

    if !failed {
        status.queue_success("Clusters do not have overlapping CIDRs");
    }
    !failed
}
