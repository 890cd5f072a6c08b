#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use serde_json::Value;

    use crate::{
        evaluate, fallback_move, search, Board, BoardError, Cell, DriftModel, HeuristicWeights,
        NodeKind, Player, SearchConfig, SearchMode, Searcher, TerminalKind, TerminalRule,
        WIN_SCORE,
    };

    fn random_positions(seed: u64, count: usize) -> Result<Vec<Board>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::with_capacity(count);
        for i in 0..count {
            positions.push(Board::random_playout(7, 6, i % 20, &mut rng)?);
        }
        Ok(positions)
    }

    fn full_board() -> Result<Board> {
        let mut board = Board::default();
        for column in 0..board.width() {
            for row in 0..board.height() {
                // pairs of rows alternate owner, shifted by one on every column
                let player = if (row / 2 + column) % 2 == 0 {
                    Player::One
                } else {
                    Player::Two
                };
                board.play(column, player)?;
            }
        }
        Ok(board)
    }

    #[test]
    pub fn drop_copies_and_stacks() -> Result<()> {
        let board = Board::default();
        let next = board.drop(3, Player::One)?;
        assert_eq!(board.get(3, 0), Cell::Empty);
        assert_eq!(next.get(3, 0), Cell::PlayerOne);

        let next = next.drop(3, Player::Two)?;
        assert_eq!(next.get(3, 1), Cell::PlayerTwo);
        assert_eq!(next.column_height(3), 2);
        assert_eq!(next.num_moves(), 2);
        Ok(())
    }

    #[test]
    pub fn full_and_missing_columns() -> Result<()> {
        let mut board = Board::default();
        for _ in 0..board.height() {
            board.play(0, Player::One)?;
        }
        assert_eq!(board.drop(0, Player::Two), Err(BoardError::ColumnFull(0)));
        assert_eq!(
            board.drop(7, Player::Two),
            Err(BoardError::ColumnOutOfRange {
                column: 7,
                width: 7
            })
        );
        assert_eq!(board.valid_moves(), vec![1, 2, 3, 4, 5, 6]);
        assert!(!board.playable(0));
        assert!(!board.playable(7));
        Ok(())
    }

    #[test]
    pub fn invalid_dimensions() {
        assert!(Board::new(0, 6).is_err());
        assert!(Board::new(7, 0).is_err());
        assert!(Board::new(17, 6).is_err());
        assert!(Board::new(1, 1).is_ok());
    }

    #[test]
    pub fn gravity_keeps_columns_contiguous() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::default();
        for _ in 0..30 {
            let moves = board.valid_moves();
            let column = moves[rng.gen_range(0..moves.len())];
            let player = if rng.gen::<bool>() {
                Player::One
            } else {
                Player::Two
            };
            board = board.drop(column, player)?;

            for column in 0..board.width() {
                let height = board.column_height(column);
                for row in 0..board.height() {
                    assert_eq!(board.get(column, row).is_empty(), row >= height);
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn run_length_scoring() -> Result<()> {
        let mut board = Board::default();
        for column in 0..3 {
            board.play(column, Player::One)?;
        }
        assert_eq!(board.score(), (0, 0));

        board.play(3, Player::One)?;
        assert_eq!(board.score(), (1, 0));

        board.play(4, Player::One)?;
        assert_eq!(board.score(), (2, 0));

        for _ in 0..4 {
            board.play(6, Player::Two)?;
        }
        assert_eq!(board.score(), (2, 1));
        Ok(())
    }

    #[test]
    pub fn score_never_decreases() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut board = Board::default();
            let mut player = Player::One;
            let mut last = board.score();
            while !board.is_full() {
                let moves = board.valid_moves();
                board.play(moves[rng.gen_range(0..moves.len())], player)?;
                let score = board.score();
                assert!(score.0 >= last.0 && score.1 >= last.1);
                last = score;
                player = player.other();
            }
        }
        Ok(())
    }

    #[test]
    pub fn diagonal_connect_four() -> Result<()> {
        // X on (0,0), (1,1), (2,2), (3,3)
        let board = Board::from_moves(7, 6, "12237334444")?;
        assert_eq!(board.has_connect_four(), Some(Player::One));
        assert_eq!(board.score(), (1, 0));

        // the same shape mirrored
        let board = Board::from_moves(7, 6, "76651554444")?;
        assert_eq!(board.has_connect_four(), Some(Player::One));

        assert_eq!(Board::default().has_connect_four(), None);
        Ok(())
    }

    #[test]
    pub fn full_board_has_no_moves() -> Result<()> {
        let board = full_board()?;
        assert!(board.is_full());
        assert!(board.valid_moves().is_empty());

        for mode in [SearchMode::Minimax, SearchMode::AlphaBeta, SearchMode::Expectiminimax].iter() {
            let result = search(&board, 3, true, *mode);
            assert_eq!(result.best_move, None);
            assert_eq!(result.chosen_move(&board), None);
        }
        assert_eq!(fallback_move(&board), None);
        Ok(())
    }

    #[test]
    pub fn move_string_parsing() -> Result<()> {
        let board = Board::from_moves(7, 6, "4455")?;
        assert_eq!(board.get(3, 0), Cell::PlayerOne);
        assert_eq!(board.get(3, 1), Cell::PlayerTwo);
        assert_eq!(board.to_move(), Player::One);
        assert_eq!(Board::from_moves(7, 6, "445")?.to_move(), Player::Two);

        assert_eq!(Board::from_moves(7, 6, "4x"), Err(BoardError::InvalidMove('x')));
        assert_eq!(Board::from_moves(7, 6, "48"), Err(BoardError::InvalidMove('8')));
        assert_eq!(Board::from_moves(7, 6, "1111111"), Err(BoardError::ColumnFull(0)));
        assert_eq!(Board::from_moves(7, 6, "12121212"), Err(BoardError::GameOver));
        Ok(())
    }

    #[test]
    pub fn board_snapshot() -> Result<()> {
        let board = Board::from_moves(3, 2, "12")?;
        assert_eq!(board.snapshot(), "000\n120");
        Ok(())
    }

    #[test]
    pub fn error_display() {
        assert_eq!(BoardError::ColumnFull(2).to_string(), "column 2 is full");
        assert_eq!(
            BoardError::InvalidMove('x').to_string(),
            "could not parse 'x' as a valid move"
        );
        assert_eq!(
            BoardError::InvalidDimensions {
                width: 0,
                height: 6
            }
            .to_string(),
            "invalid board dimensions 0x6, both must be between 1 and 16"
        );
    }

    #[test]
    pub fn evaluation_is_antisymmetric() -> Result<()> {
        assert_eq!(evaluate(&Board::default(), Player::One), 0.0);
        for board in random_positions(3, 40)? {
            assert_eq!(evaluate(&board, Player::One), -evaluate(&board, Player::Two));
        }
        Ok(())
    }

    #[test]
    pub fn evaluation_prefers_center() -> Result<()> {
        let board = Board::default();
        let center = evaluate(&board.drop(3, Player::One)?, Player::One);
        let near = evaluate(&board.drop(2, Player::One)?, Player::One);
        let edge = evaluate(&board.drop(0, Player::One)?, Player::One);
        assert!(center > near);
        assert!(near > edge);
        assert!(edge > 0.0);
        Ok(())
    }

    #[test]
    pub fn evaluation_rewards_completed_window() -> Result<()> {
        let weights = HeuristicWeights::default();
        let board = Board::from_moves(7, 6, "1122334")?;
        assert!(weights.evaluate(&board, Player::One) > weights.window_win / 2.0);
        assert!(weights.evaluate(&board, Player::Two) < -weights.window_win / 2.0);
        Ok(())
    }

    #[test]
    pub fn pruning_matches_minimax() -> Result<()> {
        let mut minimax_total = 0;
        let mut alpha_beta_total = 0;

        for board in random_positions(42, 60)? {
            let maximizing = board.to_move() == Player::One;
            for depth in 1..=3 {
                let full = search(&board, depth, maximizing, SearchMode::Minimax);
                let pruned = search(&board, depth, maximizing, SearchMode::AlphaBeta);

                assert_eq!(full.best_move, pruned.best_move);
                assert_eq!(full.value, pruned.value);
                assert!(pruned.node_count <= full.node_count);

                minimax_total += full.node_count;
                alpha_beta_total += pruned.node_count;
            }
        }
        assert!(alpha_beta_total < minimax_total);
        Ok(())
    }

    #[test]
    pub fn pruning_matches_minimax_for_second_player() -> Result<()> {
        for board in random_positions(5, 20)? {
            let maximizing = board.to_move() == Player::Two;
            let config = SearchConfig::new(SearchMode::Minimax).with_perspective(Player::Two);
            let full = Searcher::new(config.clone()).search(&board, 3, maximizing);

            let config = SearchConfig {
                mode: SearchMode::AlphaBeta,
                ..config
            };
            let pruned = Searcher::new(config).search(&board, 3, maximizing);

            assert_eq!(full.best_move, pruned.best_move);
            assert_eq!(full.value, pruned.value);
        }
        Ok(())
    }

    #[test]
    pub fn search_leaves_board_untouched() -> Result<()> {
        for board in random_positions(9, 10)? {
            let before = board.clone();
            for mode in [SearchMode::Minimax, SearchMode::AlphaBeta, SearchMode::Expectiminimax].iter() {
                let result = search(&board, 2, true, *mode);
                assert_eq!(board, before);
                if let Some(column) = result.best_move {
                    assert!(board.playable(column));
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn empty_board_opens_in_the_center() {
        let board = Board::default();
        for mode in [SearchMode::Minimax, SearchMode::AlphaBeta].iter() {
            let result = search(&board, 1, true, *mode);
            let column = result.best_move.unwrap();
            assert!((2..=4).contains(&column), "opened in column {}", column);
        }
    }

    #[test]
    pub fn completes_open_three() -> Result<()> {
        let window_win = HeuristicWeights::default().window_win;
        // X on the bottom row in columns 0..=2, O above them and in the far corner
        let board = Board::from_moves(7, 6, "112237")?;
        for mode in [SearchMode::Minimax, SearchMode::AlphaBeta].iter() {
            for depth in 1..=3 {
                let result = search(&board, depth, true, *mode);
                assert_eq!(result.best_move, Some(3));
                assert!(result.value >= window_win / 2.0);
            }
        }
        Ok(())
    }

    #[test]
    pub fn minimizer_completes_open_three() -> Result<()> {
        let window_win = HeuristicWeights::default().window_win;
        // O on the bottom row in columns 0..=2 and to move
        let board = Board::from_moves(7, 6, "7172631")?;
        assert_eq!(board.to_move(), Player::Two);
        for mode in [SearchMode::Minimax, SearchMode::AlphaBeta].iter() {
            for depth in 1..=3 {
                let result = search(&board, depth, false, *mode);
                assert_eq!(result.best_move, Some(3));
                assert!(result.value <= -window_win / 2.0);
            }
        }
        Ok(())
    }

    #[test]
    pub fn won_position_falls_back() -> Result<()> {
        let board = Board::from_moves(7, 6, "1212121")?;
        let result = search(&board, 3, false, SearchMode::AlphaBeta);
        assert_eq!(result.best_move, None);
        assert_eq!(result.value, WIN_SCORE);
        assert_eq!(result.chosen_move(&board), Some(0));
        Ok(())
    }

    #[test]
    pub fn terminal_rules() -> Result<()> {
        let board = Board::from_moves(7, 6, "1212121")?;

        let config = SearchConfig::new(SearchMode::Minimax).recording();
        let result = Searcher::new(config.clone()).search(&board, 2, false);
        assert_eq!(result.value, WIN_SCORE);
        let tree = result.tree.unwrap();
        assert_eq!(
            tree.root().unwrap().kind,
            NodeKind::Terminal {
                terminal_type: TerminalKind::Win
            }
        );

        let config = config.with_terminal_rule(TerminalRule::AnyScore);
        let result = Searcher::new(config).search(&board, 2, false);
        assert_eq!(result.best_move, None);
        assert_eq!(result.value, evaluate(&board, Player::One));

        // one ply ahead every child is a leaf under both rules
        let board = Board::from_moves(7, 6, "4453")?;
        for mode in [SearchMode::Minimax, SearchMode::AlphaBeta].iter() {
            let strict = search(&board, 1, true, *mode);
            let loose = Searcher::new(
                SearchConfig::new(*mode).with_terminal_rule(TerminalRule::AnyScore),
            )
            .search(&board, 1, true);
            assert_eq!(strict.best_move, loose.best_move);
            assert_eq!(strict.value, loose.value);
        }
        Ok(())
    }

    #[test]
    pub fn drift_distribution_is_normalised() -> Result<()> {
        let drift = DriftModel::default();
        let board = Board::default();

        let center = drift.distribution(&board, 3);
        assert_eq!(center.iter().map(|(c, _)| *c).collect::<Vec<_>>(), vec![3, 2, 4]);
        assert!((center[0].1 - 0.6).abs() < 1e-12);
        assert!((center[1].1 - 0.2).abs() < 1e-12);

        let edge = drift.distribution(&board, 0);
        assert_eq!(edge.iter().map(|(c, _)| *c).collect::<Vec<_>>(), vec![0, 1]);
        assert!((edge[0].1 - 0.75).abs() < 1e-12);
        assert!((edge[1].1 - 0.25).abs() < 1e-12);

        let mut board = Board::default();
        for _ in 0..board.height() {
            board.play(4, Player::Two)?;
        }
        for column in 0..board.width() {
            let outcomes = drift.distribution(&board, column);
            if column == 4 {
                assert!(outcomes.iter().all(|(c, _)| *c != 4));
            }
            if !outcomes.is_empty() {
                let total: f64 = outcomes.iter().map(|(_, p)| p).sum();
                assert!((total - 1.0).abs() < 1e-12);
            }
        }

        assert!(DriftModel::new(0.0, 1.0, 0.0).distribution(&board, 0).is_empty());
        Ok(())
    }

    #[test]
    pub fn expectiminimax_takes_expectations() -> Result<()> {
        let board = Board::default();
        let drift = DriftModel::default();

        let mut best_move = None;
        let mut best_value = f64::NEG_INFINITY;
        for column in board.valid_moves() {
            let mut expected = 0.0;
            for (landing, probability) in drift.distribution(&board, column) {
                expected += probability * evaluate(&board.drop(landing, Player::One)?, Player::One);
            }
            if expected > best_value {
                best_value = expected;
                best_move = Some(column);
            }
        }

        let config = SearchConfig::new(SearchMode::Expectiminimax).recording();
        let result = Searcher::new(config).search(&board, 1, true);
        assert_eq!(result.best_move, best_move);
        assert!((result.value - best_value).abs() < 1e-9);

        let stats = result.tree.unwrap().stats();
        assert_eq!(stats.max_nodes, 1);
        assert_eq!(stats.chance_nodes, 7);
        assert_eq!(stats.terminal, 19);
        assert_eq!(stats.total, 27);
        assert_eq!(stats.pruned, 0);
        assert_eq!(result.node_count, 27);
        Ok(())
    }

    #[test]
    pub fn chance_without_targets_evaluates_in_place() -> Result<()> {
        let board = Board::new(1, 6)?;
        let config = SearchConfig::new(SearchMode::Expectiminimax)
            .with_drift(DriftModel::new(0.0, 0.5, 0.5))
            .recording();
        let result = Searcher::new(config).search(&board, 2, true);

        assert_eq!(result.best_move, Some(0));
        assert_eq!(result.value, 0.0);
        assert_eq!(result.node_count, 2);

        let tree = result.tree.unwrap();
        let chance = tree.get(1).unwrap();
        assert_eq!(chance.kind, NodeKind::Chance);
        assert!(chance.children.is_empty());
        Ok(())
    }

    #[test]
    pub fn tree_records_every_node() -> Result<()> {
        let board = Board::default();
        let config = SearchConfig::new(SearchMode::Minimax).recording();
        let result = Searcher::new(config).search(&board, 2, true);
        let tree = result.tree.unwrap();

        let stats = tree.stats();
        assert_eq!(stats.total, 57);
        assert_eq!(stats.max_nodes, 1);
        assert_eq!(stats.min_nodes, 7);
        assert_eq!(stats.terminal, 49);
        assert_eq!(stats.pruned, 0);
        assert_eq!(stats.nodes_by_depth.get(&0), Some(&49));
        assert_eq!(stats.nodes_by_depth.get(&2), Some(&1));
        assert_eq!(result.node_count, 57);

        // ids are handed out when a node is created, depth first
        let root = tree.root().unwrap();
        assert_eq!(root.id, 0);
        assert_eq!(root.children, vec![1, 9, 17, 25, 33, 41, 49]);
        assert_eq!(tree.get(1).unwrap().children, (2..=8).collect::<Vec<_>>());
        assert_eq!(root.best_move(), result.best_move);

        for node in tree.nodes().iter().skip(1) {
            let parent = tree.parent(node.id).unwrap();
            assert!(parent.id < node.id);
            assert!(parent.children.contains(&node.id));
            assert_eq!(node.depth + 1, parent.depth);
        }
        assert!(tree.nodes().iter().all(|node| node.bounds.is_none()));
        Ok(())
    }

    #[test]
    pub fn tree_marks_pruned_siblings() -> Result<()> {
        let mut pruned_any = false;
        for board in random_positions(21, 20)? {
            let maximizing = board.to_move() == Player::One;
            let config = SearchConfig::new(SearchMode::AlphaBeta).recording();
            let result = Searcher::new(config).search(&board, 3, maximizing);
            let tree = result.tree.unwrap();
            let stats = tree.stats();

            assert_eq!(stats.total, result.node_count);
            assert_eq!(stats.total + stats.pruned, tree.len());
            assert_eq!(tree.metadata().unwrap().total_nodes, tree.len());

            for node in tree.nodes().iter().filter(|node| node.pruned) {
                pruned_any = true;
                assert!(node.board.is_none());
                assert!(node.value.is_none());
                assert!(node.children.is_empty());
                let bounds = node.bounds.unwrap();
                assert!(bounds.beta <= bounds.alpha);
            }
            assert!(tree
                .nodes()
                .iter()
                .all(|node| node.pruned || node.bounds.is_some()));
        }
        assert!(pruned_any);
        Ok(())
    }

    #[test]
    pub fn tree_exports() -> Result<()> {
        let board = Board::from_moves(7, 6, "443")?;
        let config = SearchConfig::new(SearchMode::Minimax).recording();
        let result = Searcher::new(config).search(&board, 1, false);
        let tree = result.tree.unwrap();

        let json: Value = serde_json::from_str(&tree.to_json()?)?;
        let root = &json["root"];
        assert_eq!(root["node_type"], "MIN");
        assert_eq!(root["id"], 0);
        assert_eq!(root["move"], Value::Null);
        assert_eq!(root["alpha"], Value::Null);
        assert_eq!(root["children"].as_array().unwrap().len(), 7);

        let child = &root["children"][0];
        assert_eq!(child["node_type"], "TERMINAL");
        assert_eq!(child["terminal_type"], "LEAF");
        assert_eq!(child["parent_id"], 0);
        assert_eq!(child["move"], 0);

        let metadata = &json["metadata"];
        assert_eq!(metadata["algorithm"], "minimax_no_pruning");
        assert_eq!(metadata["total_nodes"], 8);
        assert_eq!(metadata["current_turn"], 2);
        assert_eq!(metadata["board_width"], 7);

        let views = tree.board_views();
        assert_eq!(views.len(), 8);
        assert_eq!(views[0].board, board.snapshot());
        assert_eq!(views[1].column, Some(0));

        let outline = tree.outline();
        assert!(outline.starts_with("▼ [ROOT]"));
        assert_eq!(outline.lines().count(), 8);
        assert!(outline.contains("  ● [Col 6] Leaf"));
        Ok(())
    }

    #[test]
    pub fn expectiminimax_outline_shows_chances() -> Result<()> {
        let config = SearchConfig::new(SearchMode::Expectiminimax).recording();
        let result = Searcher::new(config).search(&Board::default(), 1, true);
        let outline = result.tree.unwrap().outline();
        assert!(outline.contains("◆ [Col 0]"));
        assert!(outline.contains("P=75.0%"));
        assert!(outline.contains("P=60.0%"));
        Ok(())
    }

    #[test]
    pub fn no_tree_unless_recording() {
        let result = search(&Board::default(), 2, true, SearchMode::AlphaBeta);
        assert!(result.tree.is_none());
    }
}
