//! Seed incidents curated from triage. Entries are append-only; once a
//! release leaves support its entries are deleted wholesale.

use chrono::{DateTime, Utc};
use sippy_core::suppress::VariantKey;

use crate::registry::{RegistryBuilder, ResolvedIssueRegistry};
use crate::types::{InfrastructureIssue, Issue, JobRun, PayloadIssue, ResolvedIssue};

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("seed timestamp must be RFC 3339")
        .with_timezone(&Utc)
}

fn run(url: &str, start: &str) -> JobRun {
    JobRun {
        url: url.to_string(),
        start_time: at(start),
    }
}

fn azure_ovn_micro() -> VariantKey {
    VariantKey {
        network: "ovn".into(),
        upgrade: "upgrade-micro".into(),
        arch: "amd64".into(),
        platform: "azure".into(),
    }
}

/// The built-in registry of curated incidents. Panics only on a malformed
/// seed entry, which is a programmer error caught by the tests below.
pub fn seeded_registry() -> ResolvedIssueRegistry {
    let mut builder = RegistryBuilder::new();

    builder
        .add(
            "4.15",
            ResolvedIssue {
                test_id: "cluster install:0cb1bb27e418491b1ffdacab58c5c8c0".into(),
                test_name: "install should succeed: overall".into(),
                variant: azure_ovn_micro(),
                issue: Issue::Infrastructure(InfrastructureIssue {
                    description: "azure cloud problems during install".into(),
                    jira_url: String::new(),
                    resolution_date: at("2024-01-21T06:09:09Z"),
                }),
                impacted_job_runs: vec![
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875344510717952",
                        "2024-01-21T01:09:09Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875347295735808",
                        "2024-01-21T01:09:09Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875348252037120",
                        "2024-01-21T01:09:10Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875344930148352",
                        "2024-01-21T01:09:09Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875345819340800",
                        "2024-01-21T01:09:09Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875343294369792",
                        "2024-01-21T01:09:08Z",
                    ),
                ],
            },
        )
        .expect("seed: 4.15 azure install incident");

    builder
        .add(
            "4.15",
            ResolvedIssue {
                test_id: "Operator results:4b5f6af893ad5577904fbaec3254506d".into(),
                test_name: "operator conditions network".into(),
                variant: azure_ovn_micro(),
                issue: Issue::Infrastructure(InfrastructureIssue {
                    description: "azure cloud problems during install".into(),
                    jira_url: "https://issues.redhat.com/browse/OCPBUGS-27495".into(),
                    resolution_date: at("2024-01-21T06:09:09Z"),
                }),
                impacted_job_runs: vec![
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875348252037120",
                        "2024-01-21T01:09:10Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875341679562752",
                        "2024-01-21T01:09:12Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.15-e2e-azure-ovn-upgrade/1748875344930148352",
                        "2024-01-21T01:09:09Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-nightly-4.15-e2e-azure-upgrade-cnv/1748875321513349120",
                        "2024-01-21T01:09:08Z",
                    ),
                ],
            },
        )
        .expect("seed: 4.15 network operator incident");

    builder
        .add(
            "4.15",
            ResolvedIssue {
                test_id: "openshift-tests-upgrade:567152bb097fa9ce13dd2fb6885e094a".into(),
                test_name:
                    "[sig-arch] events should not repeat pathologically for ns/openshift-monitoring"
                        .into(),
                variant: VariantKey {
                    network: "ovn".into(),
                    upgrade: "upgrade-minor".into(),
                    arch: "amd64".into(),
                    platform: "metal-ipi".into(),
                },
                issue: Issue::PayloadBug(PayloadIssue {
                    pull_request_url: "https://github.com/openshift/origin/pull/28549".into(),
                    resolution_date: at("2024-01-24T23:54:33Z"),
                }),
                impacted_job_runs: vec![
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-nightly-4.15-upgrade-from-stable-4.14-e2e-metal-ipi-upgrade-ovn-ipv6/1750230625601720320",
                        "2024-01-24T18:54:33Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-nightly-4.15-upgrade-from-stable-4.14-e2e-metal-ipi-upgrade-ovn-ipv6/1750060151393357824",
                        "2024-01-24T07:39:33Z",
                    ),
                ],
            },
        )
        .expect("seed: 4.15 monitoring events incident");

    builder
        .add(
            "4.16",
            ResolvedIssue {
                test_id: "cluster install:0cb1bb27e418491b1ffdacab58c5c8c0".into(),
                test_name: "install should succeed: overall".into(),
                variant: VariantKey {
                    network: "ovn".into(),
                    upgrade: "upgrade-micro".into(),
                    arch: "amd64".into(),
                    platform: "gcp".into(),
                },
                issue: Issue::Infrastructure(InfrastructureIssue {
                    description: "gcp quota exhaustion in the CI project".into(),
                    jira_url: "https://issues.redhat.com/browse/TRT-1462".into(),
                    resolution_date: at("2024-02-09T17:00:00Z"),
                }),
                impacted_job_runs: vec![
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.16-e2e-gcp-ovn-upgrade/1755559948688691200",
                        "2024-02-08T11:50:27Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.16-e2e-gcp-ovn-upgrade/1755662560587485184",
                        "2024-02-08T18:38:13Z",
                    ),
                    run(
                        "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.16-e2e-gcp-ovn-upgrade/1755765170936614912",
                        "2024-02-09T01:25:58Z",
                    ),
                ],
            },
        )
        .expect("seed: 4.16 gcp install incident");

    builder.build()
}
