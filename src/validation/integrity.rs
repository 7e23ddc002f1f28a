//! Stage C: checks on a finished graph.

use std::collections::VecDeque;

use super::{Stage, ValidationReport};
use crate::anatomy::GeneratedGraph;
use crate::core::{config, AnatomyConfig, ErrorClass, PartId, SocketCardinality};

pub struct IntegrityValidator<'a> {
    config: &'a AnatomyConfig,
}

impl Default for IntegrityValidator<'static> {
    fn default() -> Self {
        Self::new(config())
    }
}

impl<'a> IntegrityValidator<'a> {
    pub fn new(config: &'a AnatomyConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, graph: &GeneratedGraph) -> ValidationReport {
        let mut report = ValidationReport::new(Stage::Integrity);

        match graph.root_part() {
            None => {
                report.error(ErrorClass::Integrity, "graph", &format!("root {} does not exist", graph.root));
                return report;
            }
            Some(root) if root.slot.is_some() || root.parent.is_some() => {
                report.error(ErrorClass::Integrity, "graph", "root part is attached to a slot");
            }
            Some(_) => {}
        }

        self.check_sockets(graph, &mut report);
        check_back_references(graph, &mut report);
        check_reachability(graph, &mut report);

        tracing::debug!(
            recipe = %graph.recipe_id,
            parts = graph.parts.len(),
            errors = report.errors.len(),
            "integrity validation finished"
        );
        report
    }

    fn check_sockets(&self, graph: &GeneratedGraph, report: &mut ValidationReport) {
        for socket in &graph.sockets {
            let subject = format!("slot '{}'", socket.slot);
            match socket.occupant {
                Some(occupant) => {
                    let Some(part) = graph.part(occupant) else {
                        report.error(
                            ErrorClass::Integrity,
                            &subject,
                            &format!("occupant {} does not exist", occupant),
                        );
                        continue;
                    };
                    if !socket.allowed_types.iter().any(|t| t == &part.part_type) {
                        report.error(
                            ErrorClass::Integrity,
                            &subject,
                            &format!(
                                "occupant type '{}' is not allowed (allowed: {})",
                                part.part_type,
                                socket.allowed_types.join(", ")
                            ),
                        );
                    }
                    if socket.owner.is_none() {
                        report.error(ErrorClass::Integrity, &subject, "filled socket has no owning part");
                    }
                }
                None if socket.owner.is_none() => {}
                None => match socket.cardinality {
                    SocketCardinality::ExactlyOne => {
                        let message = if socket.excess_match {
                            "required socket left empty after its pattern ran out of parts"
                        } else {
                            "required socket is empty"
                        };
                        report.error(ErrorClass::Integrity, &subject, message);
                    }
                    SocketCardinality::ZeroOrOne => {
                        if self.config.require_full_coverage {
                            report.warn(ErrorClass::Integrity, &subject, "optional socket is empty");
                        }
                    }
                },
            }
        }
    }
}

/// Parts and sockets must agree on who fills what
fn check_back_references(graph: &GeneratedGraph, report: &mut ValidationReport) {
    let mut seen = vec![false; graph.parts.len()];
    for socket in &graph.sockets {
        let Some(occupant) = socket.occupant else { continue };
        let Some(flag) = seen.get_mut(occupant.index()) else { continue };
        if *flag {
            report.error(
                ErrorClass::Integrity,
                &format!("{}", occupant),
                "part occupies more than one socket",
            );
        }
        *flag = true;
    }

    for (idx, part) in graph.parts.iter().enumerate() {
        let subject = format!("{}", part.id);
        if part.id.index() != idx {
            report.error(ErrorClass::Integrity, &subject, &format!("stored at index {}", idx));
        }
        if part.id == graph.root {
            continue;
        }
        let Some(slot) = &part.slot else {
            report.error(ErrorClass::Integrity, &subject, "non-root part fills no slot");
            continue;
        };
        match graph.sockets.iter().find(|s| &s.slot == slot) {
            None => report.error(
                ErrorClass::Integrity,
                &subject,
                &format!("claims unknown slot '{}'", slot),
            ),
            Some(socket) => {
                if socket.occupant != Some(part.id) {
                    report.error(
                        ErrorClass::Integrity,
                        &subject,
                        &format!("claims slot '{}' but the socket does not hold it", slot),
                    );
                }
                if socket.owner != part.parent {
                    report.error(
                        ErrorClass::Integrity,
                        &subject,
                        &format!("parent disagrees with the owner of socket '{}'", socket.socket),
                    );
                }
            }
        }
    }
}

/// Every part must hang off the root through parent links
fn check_reachability(graph: &GeneratedGraph, report: &mut ValidationReport) {
    let mut reached = vec![false; graph.parts.len()];
    let mut queue = VecDeque::from([graph.root]);
    if let Some(flag) = reached.get_mut(graph.root.index()) {
        *flag = true;
    }

    while let Some(id) = queue.pop_front() {
        for child in graph.children_of(id) {
            if let Some(flag) = reached.get_mut(child.id.index()) {
                if !*flag {
                    *flag = true;
                    queue.push_back(child.id);
                }
            }
        }
    }

    for (idx, reached) in reached.iter().enumerate() {
        if !reached {
            report.error(
                ErrorClass::Integrity,
                &format!("{}", PartId(idx as u32)),
                "part is not reachable from the root",
            );
        }
    }
}
