//! The `dot` module contains the conversion from a state registry to the graphviz dot format.
//! The functions in this module are used for testing and debugging purposes.

use std::io::Write;

use dot_writer::{Attributes, DotWriter, RankDirection};

use super::registry::StateRegistry;

/// Render the node graph of a registry to the graphviz dot format.
#[allow(dead_code)]
pub(crate) fn automaton_render<W: Write>(registry: &StateRegistry, label: &str, output: &mut W) {
    let mut writer = DotWriter::from(output);
    writer.set_pretty_print(true);
    let mut digraph = writer.digraph();
    digraph
        .set_label(label)
        .set_rank_direction(RankDirection::LeftRight);
    for state in &registry.nodes {
        let source_id = {
            let mut source_node = digraph.node_auto();
            let name = state
                .state_name
                .map(|n| format!(" ({})", n))
                .unwrap_or_default();
            let kind = state
                .accepting
                .map(|k| format!(" k{}", k))
                .unwrap_or_default();
            source_node.set_label(&format!("{}{}{}", state.id(), name, kind));
            if state.id() == registry.start {
                source_node
                    .set_shape(dot_writer::Shape::Circle)
                    .set_color(dot_writer::Color::Blue)
                    .set_pen_width(3.0);
            }
            if state.accepting.is_some() {
                source_node
                    .set_shape(dot_writer::Shape::Circle)
                    .set_color(dot_writer::Color::Red)
                    .set_pen_width(3.0);
            }
            source_id_of(state.id().as_usize())
        };
        if let Some(next) = state.next {
            digraph
                .edge(source_id.clone(), source_id_of(next.as_usize()))
                .attributes()
                .set_label(&moves_label(state));
        }
        for &target in state.epsilon_targets.iter() {
            digraph
                .edge(source_id.clone(), source_id_of(target.as_usize()))
                .attributes()
                .set_label("ε");
        }
    }
}

fn source_id_of(index: usize) -> String {
    format!("node_{}", index)
}

/// A compact label for the characters a node consumes.
fn moves_label(state: &super::NfaState) -> String {
    let mut parts = Vec::new();
    for half in 0..2 {
        let mask = state.ascii_moves[half];
        let mut lo = None;
        for bit in 0..=64u32 {
            let set = bit < 64 && mask & (1u64 << bit) != 0;
            match (set, lo) {
                (true, None) => lo = Some(bit),
                (false, Some(start)) => {
                    let base = 64 * half as u32;
                    if start == bit - 1 {
                        parts.push(format!("{:#x}", base + start));
                    } else {
                        parts.push(format!("{:#x}-{:#x}", base + start, base + bit - 1));
                    }
                    lo = None;
                }
                _ => {}
            }
        }
    }
    for &(lo, hi) in &state.extended_ranges {
        if lo == hi {
            parts.push(format!("{:#x}", lo));
        } else {
            parts.push(format!("{:#x}-{:#x}", lo, hi));
        }
    }
    parts.join(",")
}
