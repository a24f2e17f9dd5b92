//! A recursive reference interpreter for checking [`Interpreter`](super::Interpreter).
use super::lines::Line;
use crate::Prng;
use rand::{Rng, SeedableRng};

/// A random bit sequence that is `false` forever after a fixed number of bits.
#[derive(Debug, Clone)]
pub struct BitSource {
    rng: Prng,
    remaining: usize,
}

impl BitSource {
    pub fn new(seed: u64, num_random: usize) -> Self {
        Self {
            rng: Prng::seed_from_u64(seed),
            remaining: num_random,
        }
    }

    pub fn next_bit(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.rng.gen()
    }
}

enum Node {
    Subtask(usize),
    If(Vec<Node>, Vec<Node>),
    While(Vec<Node>),
    Loop(u32, Vec<Node>),
}

/// Parse lines starting at `pos` until a block closer or `Else` (left unconsumed).
fn parse<S, C>(lines: &[Line<S, C>], pos: &mut usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    while let Some(line) = lines.get(*pos) {
        let index = *pos;
        *pos += 1;
        match line {
            Line::Subtask(_) => nodes.push(Node::Subtask(index)),
            Line::If(_) => {
                let then = parse(lines, pos);
                let otherwise = if matches!(lines.get(*pos), Some(Line::Else)) {
                    *pos += 1;
                    parse(lines, pos)
                } else {
                    Vec::new()
                };
                *pos += 1; // EndIf
                nodes.push(Node::If(then, otherwise));
            }
            Line::While(_) => {
                let body = parse(lines, pos);
                *pos += 1;
                nodes.push(Node::While(body));
            }
            Line::Loop(count) => {
                let body = parse(lines, pos);
                *pos += 1;
                nodes.push(Node::Loop(*count, body));
            }
            Line::Padding => {}
            Line::Else | Line::EndIf | Line::EndWhile | Line::EndLoop => {
                *pos = index;
                break;
            }
        }
    }
    nodes
}

fn execute(nodes: &[Node], bits: &mut BitSource, trace: &mut Vec<usize>) {
    for node in nodes {
        match node {
            Node::Subtask(index) => trace.push(*index),
            Node::If(then, otherwise) => {
                if bits.next_bit() {
                    execute(then, bits, trace)
                } else {
                    execute(otherwise, bits, trace)
                }
            }
            Node::While(body) => {
                while bits.next_bit() {
                    execute(body, bits, trace)
                }
            }
            Node::Loop(count, body) => {
                for _ in 0..*count {
                    execute(body, bits, trace)
                }
            }
        }
    }
}

/// The sequence of subtask line indices visited when running a well-nested program.
///
/// Every `If` and `While` evaluation draws the next bit from `bits`.
pub fn reference_trace<S, C>(lines: &[Line<S, C>], bits: &mut BitSource) -> Vec<usize> {
    let mut pos = 0;
    let nodes = parse(lines, &mut pos);
    assert_eq!(pos, lines.len(), "unbalanced program");
    let mut trace = Vec::new();
    execute(&nodes, bits, &mut trace);
    trace
}
