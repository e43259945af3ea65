use std::fmt::Write as _;

use log::{debug, info};

use crate::board::{Board, PieceKind, Side};
use crate::error::SearchError;
use crate::move_generator::generate_moves;
use crate::moves::{Move, MoveList};
use crate::position::{Arena, NodeId, NodeState, Position};
use crate::revisit_tracker::{PositionKey, RevisitTracker};

/// Parameters supplied by the driver. `mate_in` is in full moves; the search
/// explores to ply `2 * mate_in`.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub mate_in: u16,
    /// Keep searching after the first winning first move is proven.
    pub find_all: bool,
    /// Use the explicit-stack traversal instead of host recursion.
    pub iterative: bool,
    /// Skip re-expanding states already explored at a shallower depth.
    pub memoize: bool,
    /// Correctness-neutral; kept toggleable so equivalence is testable.
    pub survivor_pruning: bool,
    /// Abort the whole search once this many positions were expanded.
    pub max_nodes: Option<u64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            mate_in: 2,
            find_all: false,
            iterative: false,
            memoize: false,
            survivor_pruning: true,
            max_nodes: None,
        }
    }
}

/// Counters accumulated over one solve call.
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    pub wins_per_depth: Vec<u64>,
    pub draws_per_depth: Vec<u64>,
    /// Positions expanded.
    pub nodes: u64,
    /// Expansion attempts, including ones stopped by the depth bound.
    pub calls: u64,
    pub survivor_trims: u64,
    pub first_solution_trims: u64,
    pub revisit_skips: u64,
    pub node_cap_hit: bool,
}

impl SearchStats {
    fn new(max_depth: u16) -> SearchStats {
        SearchStats {
            wins_per_depth: vec![0; max_depth as usize],
            draws_per_depth: vec![0; max_depth as usize],
            ..SearchStats::default()
        }
    }
}

/// All mutable search state, threaded explicitly through every call. The
/// driver owns it for exactly one solve invocation.
struct SearchContext {
    max_depth: u16,
    /// The side that did not move first; its nodes are where survivor
    /// pruning applies.
    losing_side: Side,
    find_all: bool,
    survivor_pruning: bool,
    max_nodes: Option<u64>,
    stop: bool,
    tracker: Option<RevisitTracker>,
    stats: SearchStats,
}

/// The arena and counters left behind by a finished search, with the
/// winning tree reachable from the root through `winning_children`.
pub struct SearchOutcome {
    pub arena: Arena,
    pub root: NodeId,
    pub mate_in: u16,
    pub stats: SearchStats,
}

/// Runs the search from a validated root position.
pub fn solve(root: Position, options: &SearchOptions) -> Result<SearchOutcome, SearchError> {
    let max_depth = options.mate_in * 2;
    let mut ctx = SearchContext {
        max_depth,
        losing_side: root.to_move.opponent(),
        find_all: options.find_all,
        survivor_pruning: options.survivor_pruning,
        max_nodes: options.max_nodes,
        stop: false,
        tracker: options.memoize.then(|| RevisitTracker::new(max_depth)),
        stats: SearchStats::new(max_depth),
    };

    let mut arena = Arena::default();
    let root_id = arena.alloc(root);

    if options.iterative {
        explore_iterative(&mut ctx, &mut arena, root_id)?;
    } else {
        explore_recursive(&mut ctx, &mut arena, root_id)?;
    }

    Ok(SearchOutcome {
        arena,
        root: root_id,
        mate_in: options.mate_in,
        stats: ctx.stats,
    })
}

/// Counts the call, applies the depth bound and node cap, numbers the node,
/// computes the side to move's checks and generates its candidate moves.
/// Returns None when the node is abandoned unexpanded.
fn begin_expansion(
    ctx: &mut SearchContext,
    arena: &mut Arena,
    id: NodeId,
) -> Result<Option<MoveList>, SearchError> {
    ctx.stats.calls += 1;
    if arena[id].depth >= ctx.max_depth {
        return Ok(None);
    }
    if let Some(cap) = ctx.max_nodes {
        if ctx.stats.nodes >= cap {
            ctx.stats.node_cap_hit = true;
            ctx.stop = true;
            return Ok(None);
        }
    }

    let num = ctx.stats.nodes;
    ctx.stats.nodes += 1;
    if num > 0 && num % 50_000 == 0 {
        debug!("games explored: {num}");
    }

    let node = &mut arena[id];
    node.num = num;
    node.state = NodeState::Expanding;
    let side = node.to_move;
    let checks = node.compute_checks(side);
    if checks > 2 {
        return Err(SearchError::InvariantViolation {
            num,
            depth: node.depth,
            side,
            checks,
        });
    }
    Ok(Some(generate_moves(node, checks)))
}

/// Builds the child for one successor board and applies the king-safety
/// test. None means the mover's own king is left in check, an expected
/// branch-pruning outcome rather than an error. On success the child's turn
/// is flipped and it joins the arena.
fn spawn_child(
    arena: &mut Arena,
    parent_id: NodeId,
    mv: Move,
    board: Board,
    promo: Option<PieceKind>,
) -> Option<NodeId> {
    let mut child = arena[parent_id].child(parent_id, mv, board, promo);
    let mover = child.to_move;
    if child.compute_checks(mover) > 0 {
        return None;
    }
    child.flip_turn();
    Some(arena.alloc(child))
}

/// Registers `id` in its parent's forced-win set. When the parent is the
/// root this is a freshly proven winning first move, which in first-only
/// mode stops the whole search.
fn notify_parent_win(ctx: &mut SearchContext, arena: &mut Arena, id: NodeId) {
    let Some(parent) = arena[id].parent else {
        return;
    };
    let root_child = arena[parent].parent.is_none();
    let parent_node = &mut arena[parent];
    if parent_node.winning_children.contains(&id) {
        return;
    }
    parent_node.winning_children.push(id);
    if root_child {
        let found = parent_node.winning_children.len();
        info!("found a mate-in-{} first move ({found} so far)", ctx.max_depth / 2);
        if !ctx.find_all {
            ctx.stop = true;
        }
    }
}

/// Terminal classification, run after all of a node's moves were tried and
/// the surviving children collected. Draw on bare kings or stalemate, win
/// for the opponent on checkmate, and otherwise a forced win exactly when
/// every valid child is already a forced win for its own opponent.
fn verify(ctx: &mut SearchContext, arena: &mut Arena, id: NodeId, valid_children: &[NodeId]) {
    let depth = arena[id].depth as usize;

    if arena[id].total_pieces() == 2 {
        ctx.stats.draws_per_depth[depth] += 1;
        let node = &mut arena[id];
        node.state = NodeState::Draw;
        debug!(
            "game over: draw (only both Kings remain), game #{}, depth {depth}",
            node.num
        );
        return;
    }

    if valid_children.is_empty() {
        let node = &mut arena[id];
        if node.checks[node.to_move.index()] > 0 {
            ctx.stats.wins_per_depth[depth] += 1;
            node.state = NodeState::Win;
            debug!("win for {}, game #{}, depth {depth}", node.waiting(), node.num);
            notify_parent_win(ctx, arena, id);
        } else {
            ctx.stats.draws_per_depth[depth] += 1;
            node.state = NodeState::Draw;
            debug!("draw (stalemate), game #{}, depth {depth}", node.num);
        }
        return;
    }

    arena[id].state = NodeState::Expanded;
    if valid_children
        .iter()
        .any(|&c| arena[c].winning_children.is_empty())
    {
        // some reply survives, nothing to propagate
        return;
    }

    // Every reply loses. Mark all children as forced-win contributors and
    // pass the news one level up.
    for &child in valid_children {
        notify_parent_win(ctx, arena, child);
    }
    notify_parent_win(ctx, arena, id);
}

/// Natural call-stack traversal. Returns whether the node was fully
/// expanded and verified, which is what the revisit tracker may record.
fn explore_recursive(
    ctx: &mut SearchContext,
    arena: &mut Arena,
    id: NodeId,
) -> Result<bool, SearchError> {
    let Some(moves) = begin_expansion(ctx, arena, id)? else {
        return Ok(false);
    };
    let losing_mover = arena[id].to_move == ctx.losing_side;
    let mut valid_children: Vec<NodeId> = Vec::new();

    'moves: for mv in moves {
        if ctx.stop {
            return Ok(false);
        }
        if !ctx.find_all && !losing_mover && !arena[id].winning_children.is_empty() {
            // one witnessing win is all the caller asked for
            ctx.stats.first_solution_trims += 1;
            return Ok(false);
        }

        for (board, promo) in arena[id].successor_boards(mv) {
            let Some(child_id) = spawn_child(arena, id, mv, board, promo) else {
                // King left in check. A rejected queen promotion rules out
                // the knight sibling too, since king safety does not depend
                // on the promotion choice.
                continue 'moves;
            };
            valid_children.push(child_id);

            let key = ctx.tracker.as_ref().map(|t| t.key(&arena[child_id]));
            if let (Some(tracker), Some(k)) = (&ctx.tracker, key.as_ref()) {
                if tracker.explored_at(k) <= arena[child_id].depth {
                    ctx.stats.revisit_skips += 1;
                    continue;
                }
            }

            let completed = explore_recursive(ctx, arena, child_id)?;
            if completed {
                if let (Some(tracker), Some(k)) = (&mut ctx.tracker, key) {
                    tracker.record(k, arena[child_id].depth);
                }
            }
            if ctx.stop {
                return Ok(false);
            }
            if ctx.survivor_pruning && losing_mover && arena[child_id].winning_children.is_empty() {
                // The defender found one reply the attacker cannot break;
                // no sibling move can turn this node into a forced mate.
                ctx.stats.survivor_trims += 1;
                return Ok(false);
            }
        }
    }

    verify(ctx, arena, id, &valid_children);
    Ok(true)
}

struct Frame {
    id: NodeId,
    depth: u16,
    /// This node's revisit key, recorded by the parent's bookkeeping when
    /// the frame pops fully explored. None for the root.
    my_key: Option<PositionKey>,
    moves: MoveList,
    next_move: usize,
    /// Successor boards of the move currently being expanded.
    boards: Vec<(Move, Board, Option<PieceKind>)>,
    next_board: usize,
    valid_children: Vec<NodeId>,
    losing_mover: bool,
}

impl Frame {
    fn new(ctx: &SearchContext, arena: &Arena, id: NodeId, key: Option<PositionKey>, moves: MoveList) -> Frame {
        Frame {
            id,
            depth: arena[id].depth,
            my_key: key,
            moves,
            next_move: 0,
            boards: Vec::new(),
            next_board: 0,
            valid_children: Vec::new(),
            losing_mover: arena[id].to_move == ctx.losing_side,
        }
    }
}

/// Explicit-stack twin of `explore_recursive`, for large N where 2N
/// recursion frames would be unwelcome on the host stack. Expansion,
/// spawning, pruning and verification are the same routines, so the two
/// traversals produce identical results.
fn explore_iterative(
    ctx: &mut SearchContext,
    arena: &mut Arena,
    root_id: NodeId,
) -> Result<(), SearchError> {
    let mut stack: Vec<Frame> = Vec::new();
    // (node, depth, key, fully explored) of the frame that just popped
    let mut returned: Option<(NodeId, u16, Option<PositionKey>, bool)> = None;

    match begin_expansion(ctx, arena, root_id)? {
        Some(moves) => stack.push(Frame::new(ctx, arena, root_id, None, moves)),
        None => return Ok(()),
    }

    loop {
        // Bookkeeping the recursive version does right after a child call
        // returns: record the revisit key, then stop or survivor-prune.
        if let Some((child_id, child_depth, child_key, completed)) = returned.take() {
            if stack.is_empty() {
                break;
            }
            if completed {
                if let (Some(tracker), Some(key)) = (&mut ctx.tracker, child_key) {
                    tracker.record(key, child_depth);
                }
            }
            let prune = if ctx.stop {
                true
            } else if ctx.survivor_pruning
                && stack.last().unwrap().losing_mover
                && arena[child_id].winning_children.is_empty()
            {
                ctx.stats.survivor_trims += 1;
                true
            } else {
                false
            };
            if prune {
                let frame = stack.pop().unwrap();
                returned = Some((frame.id, frame.depth, frame.my_key, false));
                continue;
            }
        }

        let Some(top) = stack.last_mut() else {
            break;
        };

        // A successor board of the current move is pending.
        if top.next_board < top.boards.len() {
            let (mv, board, promo) = top.boards[top.next_board];
            top.next_board += 1;
            let parent_id = top.id;

            match spawn_child(arena, parent_id, mv, board, promo) {
                None => {
                    // king left in check; drop the promotion sibling too
                    let top = stack.last_mut().unwrap();
                    top.boards.clear();
                    top.next_board = 0;
                }
                Some(child_id) => {
                    stack.last_mut().unwrap().valid_children.push(child_id);

                    let child_depth = arena[child_id].depth;
                    let key = ctx.tracker.as_ref().map(|t| t.key(&arena[child_id]));
                    if let (Some(tracker), Some(k)) = (&ctx.tracker, key.as_ref()) {
                        if tracker.explored_at(k) <= child_depth {
                            ctx.stats.revisit_skips += 1;
                            continue;
                        }
                    }

                    match begin_expansion(ctx, arena, child_id)? {
                        Some(moves) => stack.push(Frame::new(ctx, arena, child_id, key, moves)),
                        None => returned = Some((child_id, child_depth, key, false)),
                    }
                }
            }
            continue;
        }

        // Fetch the next move, honoring the same per-move gates as the
        // recursive loop head.
        if top.next_move < top.moves.len() {
            if ctx.stop {
                let frame = stack.pop().unwrap();
                returned = Some((frame.id, frame.depth, frame.my_key, false));
                continue;
            }
            if !ctx.find_all && !top.losing_mover && !arena[top.id].winning_children.is_empty() {
                ctx.stats.first_solution_trims += 1;
                let frame = stack.pop().unwrap();
                returned = Some((frame.id, frame.depth, frame.my_key, false));
                continue;
            }
            let top = stack.last_mut().unwrap();
            let mv = top.moves[top.next_move];
            top.next_move += 1;
            let parent_id = top.id;
            let boards = arena[parent_id].successor_boards(mv);
            let top = stack.last_mut().unwrap();
            top.boards = boards.into_iter().map(|(b, p)| (mv, b, p)).collect();
            top.next_board = 0;
            continue;
        }

        // All moves tried: classify and pop.
        let frame = stack.pop().unwrap();
        verify(ctx, arena, frame.id, &frame.valid_children);
        returned = Some((frame.id, frame.depth, frame.my_key, true));
    }

    Ok(())
}

impl SearchOutcome {
    pub fn has_solution(&self) -> bool {
        !self.arena[self.root].winning_children.is_empty()
    }

    /// Distinct winning first moves, in discovery order.
    pub fn winning_first_moves(&self) -> Vec<String> {
        self.arena[self.root]
            .winning_children
            .iter()
            .map(|&c| self.move_token(c))
            .collect()
    }

    pub fn first_move_count(&self) -> usize {
        self.arena[self.root].winning_children.len()
    }

    /// Algebraic-style token for the move that produced `id`: piece letter,
    /// origin, capture marker, destination, promotion suffix, then `#` for
    /// the mating move or `+` for a plain check. Castles render as 0-0 or
    /// 0-0-0. The root without a last-move record renders as "?".
    pub fn move_token(&self, id: NodeId) -> String {
        let node = &self.arena[id];
        let Some(last) = node.last_move else {
            return String::from("?");
        };

        let landed = node.board.get(last.to).unwrap();
        let mut token;
        if landed.kind == PieceKind::King && last.file_delta().abs() == 2 {
            token = String::from(if last.file_delta() == 2 { "0-0" } else { "0-0-0" });
        } else {
            match node.parent {
                Some(parent_id) => {
                    let parent = &self.arena[parent_id];
                    let moved = parent.board.get(last.from).unwrap();
                    token = format!("{}{}", moved.kind.letter(), last.from);
                    let capture = parent.board.get(last.to).is_some()
                        || (moved.kind == PieceKind::Pawn && last.file_delta() != 0);
                    if capture {
                        token.push('x');
                    }
                    let _ = write!(token, "{}", last.to);
                    if let Some(promo) = last.promotion {
                        let _ = write!(token, "={}", promo.letter());
                    }
                }
                None => {
                    // root seeded with an input last move
                    token = format!("{}{}{}", landed.kind.letter(), last.from, last.to);
                }
            }
        }

        if node.state == NodeState::Win {
            token.push('#');
        } else if node.checks[node.to_move.index()] > 0 {
            token.push('+');
        }
        token
    }

    /// Indented rendering of the full winning tree with a running node
    /// count, plus that final count. The root line renders as "?".
    pub fn render_winning_tree(&self) -> (String, u64) {
        let mut out = String::new();
        let mut count = 0;
        self.render_node(self.root, "", &mut out, &mut count);
        (out, count)
    }

    fn render_node(&self, id: NodeId, indent: &str, out: &mut String, count: &mut u64) {
        let token = self.move_token(id);
        if token != "?" {
            *count += 1;
        }
        let pad = " ".repeat(30usize.saturating_sub(indent.len() + token.len()).max(2));
        let _ = writeln!(out, "{indent}{token}{pad}({count})");
        let children = self.arena[id].winning_children.clone();
        let deeper = format!("{indent}    ");
        for child in children {
            self.render_node(child, &deeper, out, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, PieceKind, Side, Square};
    use crate::position::validate_start;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn pc(kind: PieceKind, side: Side) -> Piece {
        Piece::new(kind, side)
    }

    /// Back-rank mate in one: Qd8# is the only winning first move.
    fn back_rank_position() -> Position {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("a1")),
                (pc(PieceKind::Queen, Side::White), sq("d1")),
            ],
            vec![
                (pc(PieceKind::King, Side::Black), sq("a8")),
                (pc(PieceKind::Pawn, Side::Black), sq("a7")),
                (pc(PieceKind::Pawn, Side::Black), sq("b7")),
            ],
            None,
        );
        validate_start(&mut pos).unwrap();
        pos
    }

    /// King and rook mate in two: 1.Kg6 Kg8 2.Rb8#.
    fn rook_mate_in_two() -> Position {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![
                (pc(PieceKind::King, Side::White), sq("f6")),
                (pc(PieceKind::Rook, Side::White), sq("b7")),
            ],
            vec![(pc(PieceKind::King, Side::Black), sq("h8"))],
            None,
        );
        validate_start(&mut pos).unwrap();
        pos
    }

    #[test]
    fn back_rank_mate_in_one_has_exactly_one_winning_move() {
        let options = SearchOptions {
            mate_in: 1,
            find_all: true,
            ..SearchOptions::default()
        };
        let outcome = solve(back_rank_position(), &options).unwrap();

        assert!(outcome.has_solution());
        assert_eq!(outcome.winning_first_moves(), vec!["Qd1d8#".to_string()]);
        assert_eq!(outcome.stats.wins_per_depth[1], 1);
        assert_eq!(outcome.stats.draws_per_depth, vec![0, 0]);
    }

    #[test]
    fn first_only_mode_finds_a_member_of_the_full_set() {
        let all = solve(
            back_rank_position(),
            &SearchOptions {
                mate_in: 1,
                find_all: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();
        let first = solve(
            back_rank_position(),
            &SearchOptions {
                mate_in: 1,
                find_all: false,
                ..SearchOptions::default()
            },
        )
        .unwrap();

        assert_eq!(first.first_move_count(), 1);
        let witness = &first.winning_first_moves()[0];
        assert!(all.winning_first_moves().contains(witness));
    }

    #[test]
    fn rook_mate_in_two_is_found_and_rendered() {
        let options = SearchOptions {
            mate_in: 2,
            find_all: true,
            ..SearchOptions::default()
        };
        let outcome = solve(rook_mate_in_two(), &options).unwrap();

        assert_eq!(outcome.winning_first_moves(), vec!["Kf6g6".to_string()]);
        let (tree, count) = outcome.render_winning_tree();
        assert!(tree.contains("Kf6g6"));
        assert!(tree.contains("Rb7b8#"), "mating move missing from tree:\n{tree}");
        assert!(count >= 3, "winning line has at least three plies, got {count}");
    }

    #[test]
    fn iterative_traversal_matches_recursion() {
        for find_all in [true, false] {
            let recursive = solve(
                rook_mate_in_two(),
                &SearchOptions {
                    mate_in: 2,
                    find_all,
                    iterative: false,
                    ..SearchOptions::default()
                },
            )
            .unwrap();
            let iterative = solve(
                rook_mate_in_two(),
                &SearchOptions {
                    mate_in: 2,
                    find_all,
                    iterative: true,
                    ..SearchOptions::default()
                },
            )
            .unwrap();

            assert_eq!(recursive.winning_first_moves(), iterative.winning_first_moves());
            assert_eq!(recursive.stats.wins_per_depth, iterative.stats.wins_per_depth);
            assert_eq!(recursive.stats.draws_per_depth, iterative.stats.draws_per_depth);
            assert_eq!(recursive.stats.nodes, iterative.stats.nodes);
            assert_eq!(recursive.stats.calls, iterative.stats.calls);
            assert_eq!(recursive.stats.survivor_trims, iterative.stats.survivor_trims);
            assert_eq!(
                recursive.render_winning_tree(),
                iterative.render_winning_tree()
            );
        }
    }

    #[test]
    fn survivor_pruning_does_not_change_the_winning_moves() {
        let pruned = solve(
            rook_mate_in_two(),
            &SearchOptions {
                mate_in: 2,
                find_all: true,
                survivor_pruning: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();
        let full = solve(
            rook_mate_in_two(),
            &SearchOptions {
                mate_in: 2,
                find_all: true,
                survivor_pruning: false,
                ..SearchOptions::default()
            },
        )
        .unwrap();

        assert_eq!(pruned.winning_first_moves(), full.winning_first_moves());
        assert!(pruned.stats.survivor_trims > 0);
        assert_eq!(full.stats.survivor_trims, 0);
        assert!(pruned.stats.nodes <= full.stats.nodes);
    }

    #[test]
    fn two_kings_verify_as_a_draw_at_the_root() {
        let mut pos = Position::from_pieces(
            Side::White,
            vec![(pc(PieceKind::King, Side::White), sq("e1"))],
            vec![(pc(PieceKind::King, Side::Black), sq("e8"))],
            None,
        );
        validate_start(&mut pos).unwrap();

        let outcome = solve(
            pos,
            &SearchOptions {
                mate_in: 1,
                find_all: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();

        assert!(!outcome.has_solution());
        assert_eq!(outcome.stats.draws_per_depth[0], 1);
        assert!(outcome.stats.wins_per_depth.iter().all(|&w| w == 0));
    }

    #[test]
    fn every_reachable_node_keeps_the_core_invariants() {
        let outcome = solve(
            rook_mate_in_two(),
            &SearchOptions {
                mate_in: 2,
                find_all: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();

        for node in outcome.arena.iter() {
            assert_eq!(node.pieces[0][0].0.kind, PieceKind::King);
            assert_eq!(node.pieces[1][0].0.kind, PieceKind::King);
            assert!(node.checks[0] <= 2 && node.checks[1] <= 2);
        }
    }

    #[test]
    fn king_retreat_along_the_checking_ray_is_rejected() {
        // Ra1 checks along the first rank. The footprint, computed with the
        // king still on e1, shows f1 unattacked, so e1f1 is generated; the
        // post-move test must still throw it out.
        let mut pos = Position::from_pieces(
            Side::White,
            vec![(pc(PieceKind::King, Side::White), sq("e1"))],
            vec![
                (pc(PieceKind::King, Side::Black), sq("h8")),
                (pc(PieceKind::Rook, Side::Black), sq("a1")),
            ],
            None,
        );
        validate_start(&mut pos).unwrap();

        let outcome = solve(
            pos,
            &SearchOptions {
                mate_in: 1,
                find_all: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();

        let mut destinations: Vec<String> = outcome
            .arena
            .iter()
            .filter(|n| n.parent == Some(outcome.root))
            .map(|n| n.last_move.unwrap().to.to_string())
            .collect();
        destinations.sort();
        assert_eq!(destinations, vec!["d2", "e2", "f2"]);
        for node in outcome.arena.iter().filter(|n| n.parent == Some(outcome.root)) {
            assert_ne!(node.king_square(Side::White), sq("f1"));
        }
    }

    #[test]
    fn node_cap_aborts_gracefully() {
        let outcome = solve(
            rook_mate_in_two(),
            &SearchOptions {
                mate_in: 2,
                find_all: true,
                max_nodes: Some(5),
                ..SearchOptions::default()
            },
        )
        .unwrap();
        assert!(outcome.stats.node_cap_hit);
        assert!(outcome.stats.nodes <= 5);
    }

    #[test]
    fn memoized_variant_still_finds_the_back_rank_mate() {
        let outcome = solve(
            back_rank_position(),
            &SearchOptions {
                mate_in: 1,
                find_all: true,
                memoize: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();
        assert_eq!(outcome.winning_first_moves(), vec!["Qd1d8#".to_string()]);
    }
}
