//! End-to-end simulation scenarios driven through the builder API.

use volt_core::Type;
use volt_sim::ir::{BinaryOp, BlockMode, Edge, TimeUnit, build};
use volt_sim::{Design, OutMode, ScopeId, SimConfig, Simulator, Stmt, SystemTId};

/// A design with one system and one scope, the shape every scenario uses.
fn one_scope_design(name: &str) -> (Design, SystemTId, ScopeId) {
    let mut design = Design::new();
    let top = design.add_system(name);
    let scope = design.add_scope("main");
    design.set_system_scope(top, scope);
    (design, top, scope)
}

fn mute(name: &str) -> SimConfig {
    SimConfig {
        name: name.to_string(),
        out_mode: OutMode::Mute,
        limit_ps: u64::MAX,
    }
}

#[test]
fn test_dff_samples_d_on_rising_edge() {
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("dff");
    let clk = design.add_signal("clk", bit);
    let d = design.add_signal("d", bit);
    let q = design.add_signal("q", bit);
    for s in [clk, d, q] {
        design.add_scope_inner(scope, s);
    }

    // Drive clk = 0,1,0,1 with d = 0,1,1,0 on 5 ps ticks.
    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    let mut stmts = Vec::new();
    for (cv, dv) in [(0, 0), (1, 1), (0, 1), (1, 0)] {
        stmts.push(build::transmit(
            build::sig_ref(clk),
            build::value_numeric(bit, cv),
        ));
        stmts.push(build::transmit(
            build::sig_ref(d),
            build::value_numeric(bit, dv),
        ));
        stmts.push(build::time_wait(5, TimeUnit::Ps));
    }
    design.set_behavior_block(driver, build::block(BlockMode::Par, stmts));

    // q samples d on every rising clock edge, sequentially.
    let dff = design.add_behavior(false);
    design.add_scope_behavior(scope, dff);
    design.add_behavior_event(dff, Edge::Pos, clk);
    design.set_behavior_block(
        dff,
        build::block(
            BlockMode::Seq,
            vec![build::transmit(build::sig_ref(q), build::sig(d))],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("dff")).unwrap();
    sim.run();

    assert_eq!(sim.time(), 20);
    let q_port = sim.find_port("q").unwrap();
    // Last rising edge sampled d = 0.
    assert_eq!(sim.read_port(q_port), 0);
}

#[test]
fn test_combinational_adder() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let t5 = Type::vector(bit, 5);
    let (mut design, top, scope) = one_scope_design("adder");
    let a = design.add_signal("a", t4);
    let b = design.add_signal("b", t4);
    let s = design.add_signal("s", t5);
    for sig in [a, b, s] {
        design.add_scope_inner(scope, sig);
    }

    // s <= cast(a, 5) + cast(b, 5), recomputed on any change of a or b.
    let comb = design.add_behavior(false);
    design.add_scope_behavior(scope, comb);
    design.add_behavior_event(comb, Edge::Any, a);
    design.add_behavior_event(comb, Edge::Any, b);
    design.set_behavior_block(
        comb,
        build::block(
            BlockMode::Par,
            vec![build::transmit(
                build::sig_ref(s),
                build::binary(
                    BinaryOp::Add,
                    build::cast(t5, build::sig(a)),
                    build::cast(t5, build::sig(b)),
                ),
            )],
        ),
    );

    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    design.set_behavior_block(
        driver,
        build::block(
            BlockMode::Par,
            vec![
                build::transmit(build::sig_ref(a), build::value_numeric(t4, 0b0011)),
                build::transmit(build::sig_ref(b), build::value_numeric(t4, 0b0110)),
                build::time_wait(5, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("adder")).unwrap();
    sim.run();

    let s_port = sim.find_port("s").unwrap();
    assert_eq!(sim.read_port(s_port), 0b01001);
}

#[test]
fn test_range_write_preserves_high_impedance() {
    let bit = Type::bit();
    let t8 = Type::vector(bit, 8);
    let t2 = Type::vector(bit, 2);
    let (mut design, top, scope) = one_scope_design("zwrite");
    let v = design.add_signal("v", t8);
    design.add_scope_inner(scope, v);
    design.set_signal_value(v, build::value_bitstring(t8, "zzzz_zzzz").unwrap());

    // Write "10" into v[2:1]; untouched positions keep their z.
    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    design.set_behavior_block(
        driver,
        build::block(
            BlockMode::Par,
            vec![
                build::transmit(
                    build::ref_range(
                        t2,
                        build::value_numeric(t4_index(), 1),
                        build::value_numeric(t4_index(), 2),
                        build::sig_ref(v),
                    ),
                    build::value_bitstring(t2, "10").unwrap(),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("zwrite")).unwrap();
    sim.run();

    let v_port = sim.find_port("v").unwrap();
    let value = sim.with_ports(|p| p.read_port_value(v_port));
    assert_eq!(value.to_bit_string(), "zzzzz10z");
}

fn t4_index() -> Type {
    Type::vector(Type::bit(), 4)
}

#[test]
fn test_event_chain_fires_in_same_round() {
    // sig1 rises at #10; a behavior on posedge(sig1) raises sig2 in the
    // same propagation round.
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("chain");
    let sig1 = design.add_signal("sig1", bit);
    let sig2 = design.add_signal("sig2", bit);
    design.add_scope_inner(scope, sig1);
    design.add_scope_inner(scope, sig2);

    let a = design.add_behavior(true);
    design.add_scope_behavior(scope, a);
    design.set_behavior_block(
        a,
        build::block(
            BlockMode::Par,
            vec![
                build::time_wait(10, TimeUnit::Ps),
                build::transmit(build::sig_ref(sig1), build::value_numeric(bit, 1)),
            ],
        ),
    );

    let b = design.add_behavior(false);
    design.add_scope_behavior(scope, b);
    design.add_behavior_event(b, Edge::Pos, sig1);
    design.set_behavior_block(
        b,
        build::block(
            BlockMode::Seq,
            vec![build::transmit(build::sig_ref(sig2), build::value_numeric(bit, 1))],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("chain")).unwrap();
    sim.run();

    assert_eq!(sim.time(), 10);
    let p1 = sim.find_port("sig1").unwrap();
    let p2 = sim.find_port("sig2").unwrap();
    assert_eq!(sim.read_port(p1), 1);
    assert_eq!(sim.read_port(p2), 1);
}

#[test]
fn test_case_falls_through_to_default() {
    let t4 = Type::vector(Type::bit(), 4);
    let (mut design, top, scope) = one_scope_design("hcase");
    let out = design.add_signal("out", t4);
    design.add_scope_inner(scope, out);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    let case = build::hcase(
        build::value_numeric(t4, 2),
        vec![
            (
                build::value_numeric(t4, 1),
                build::transmit(build::sig_ref(out), build::value_numeric(t4, 10)),
            ),
            (
                build::value_numeric(t4, 3),
                build::transmit(build::sig_ref(out), build::value_numeric(t4, 11)),
            ),
        ],
        Some(build::transmit(
            build::sig_ref(out),
            build::value_numeric(t4, 12),
        )),
    );
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![case, build::time_wait(1, TimeUnit::Ps)],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("hcase")).unwrap();
    sim.run();

    let out_port = sim.find_port("out").unwrap();
    assert_eq!(sim.read_port(out_port), 12);
}

#[test]
fn test_case_matches_against_undefined_scrutinee() {
    // An undefined scrutinee matches nothing under C-style equality, so
    // the default runs.
    let t2 = Type::vector(Type::bit(), 2);
    let (mut design, top, scope) = one_scope_design("hcase_x");
    let out = design.add_signal("out", t2);
    design.add_scope_inner(scope, out);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    let case = build::hcase(
        build::value_bitstring(t2, "1x").unwrap(),
        vec![(
            build::value_numeric(t2, 2),
            build::transmit(build::sig_ref(out), build::value_numeric(t2, 1)),
        )],
        Some(build::transmit(
            build::sig_ref(out),
            build::value_numeric(t2, 3),
        )),
    );
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![case, build::time_wait(1, TimeUnit::Ps)],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("hcase_x")).unwrap();
    sim.run();

    let out_port = sim.find_port("out").unwrap();
    assert_eq!(sim.read_port(out_port), 3);
}

#[test]
fn test_if_with_undefined_condition_takes_else() {
    let bit = Type::bit();
    let t2 = Type::vector(bit, 2);
    let (mut design, top, scope) = one_scope_design("hif_x");
    let out = design.add_signal("out", t2);
    design.add_scope_inner(scope, out);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    let cond = build::value_bitstring(bit, "x").unwrap();
    let hif = build::hif(
        cond,
        build::transmit(build::sig_ref(out), build::value_numeric(t2, 1)),
        vec![],
        Some(build::transmit(
            build::sig_ref(out),
            build::value_numeric(t2, 2),
        )),
    );
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![hif, build::time_wait(1, TimeUnit::Ps)],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("hif_x")).unwrap();
    sim.run();

    let out_port = sim.find_port("out").unwrap();
    assert_eq!(sim.read_port(out_port), 2);
}

#[test]
fn test_else_if_chain_in_order() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let (mut design, top, scope) = one_scope_design("hif_chain");
    let out = design.add_signal("out", t4);
    design.add_scope_inner(scope, out);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    let hif = build::hif(
        build::value_numeric(bit, 0),
        build::transmit(build::sig_ref(out), build::value_numeric(t4, 1)),
        vec![
            (
                build::value_numeric(bit, 1),
                build::transmit(build::sig_ref(out), build::value_numeric(t4, 2)),
            ),
            (
                build::value_numeric(bit, 1),
                build::transmit(build::sig_ref(out), build::value_numeric(t4, 3)),
            ),
        ],
        Some(build::transmit(
            build::sig_ref(out),
            build::value_numeric(t4, 4),
        )),
    );
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![hif, build::time_wait(1, TimeUnit::Ps)],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("hif_chain")).unwrap();
    sim.run();

    let out_port = sim.find_port("out").unwrap();
    assert_eq!(sim.read_port(out_port), 2);
}

#[test]
fn test_two_worker_threads_synchronize_time() {
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("workers");
    let s1 = design.add_signal("s1", bit);
    let s2 = design.add_signal("s2", bit);
    let s3 = design.add_signal("s3", bit);
    for s in [s1, s2, s3] {
        design.add_scope_inner(scope, s);
    }

    // Worker A raises s1 at 10 ps; worker B raises s2 at 20 ps.
    let a = design.add_behavior(true);
    design.add_scope_behavior(scope, a);
    design.set_behavior_block(
        a,
        build::block(
            BlockMode::Par,
            vec![
                build::time_wait(10, TimeUnit::Ps),
                build::transmit(build::sig_ref(s1), build::value_numeric(bit, 1)),
                build::time_wait(10, TimeUnit::Ps),
            ],
        ),
    );
    let b = design.add_behavior(true);
    design.add_scope_behavior(scope, b);
    design.set_behavior_block(
        b,
        build::block(
            BlockMode::Par,
            vec![
                build::time_wait(20, TimeUnit::Ps),
                build::transmit(build::sig_ref(s2), build::value_numeric(bit, 1)),
            ],
        ),
    );

    // s3 follows s1 combinationally.
    let follow = design.add_behavior(false);
    design.add_scope_behavior(scope, follow);
    design.add_behavior_event(follow, Edge::Pos, s1);
    design.set_behavior_block(
        follow,
        build::block(
            BlockMode::Seq,
            vec![build::transmit(build::sig_ref(s3), build::sig(s1))],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("workers")).unwrap();
    sim.run();

    assert_eq!(sim.time(), 20);
    for name in ["s1", "s2", "s3"] {
        let p = sim.find_port(name).unwrap();
        assert_eq!(sim.read_port(p), 1, "signal {name} should have risen");
    }
}

#[test]
fn test_time_terminate_stops_the_run() {
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("term");
    let s = design.add_signal("s", bit);
    design.add_scope_inner(scope, s);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Par,
            vec![
                build::time_wait(5, TimeUnit::Ps),
                build::time_terminate(),
                // Never reached.
                build::transmit(build::sig_ref(s), build::value_numeric(bit, 1)),
                build::time_wait(5, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("term")).unwrap();
    sim.run();

    assert_eq!(sim.time(), 5);
    let p = sim.find_port("s").unwrap();
    assert_eq!(sim.read_port(p), 0);
}

#[test]
fn test_time_limit_stops_an_endless_driver() {
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("limit");
    let clk = design.add_signal("clk", bit);
    design.add_scope_inner(scope, clk);

    // An unbounded toggle loop; only the limit ends it.
    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Par,
            vec![build::time_repeat(
                -1,
                Stmt::Block(build::block(
                    BlockMode::Par,
                    vec![
                        build::transmit(build::sig_ref(clk), build::value_numeric(bit, 1)),
                        build::time_wait(5, TimeUnit::Ps),
                        build::transmit(build::sig_ref(clk), build::value_numeric(bit, 0)),
                        build::time_wait(5, TimeUnit::Ps),
                    ],
                )),
            )],
        ),
    );

    let mut sim = Simulator::new(
        design,
        top,
        SimConfig {
            name: "limit".to_string(),
            out_mode: OutMode::Mute,
            limit_ps: 50,
        },
    )
    .unwrap();
    sim.run();

    assert_eq!(sim.time(), 50);
}

#[test]
fn test_repeat_runs_body_count_times() {
    let t8 = Type::vector(Type::bit(), 8);
    let (mut design, top, scope) = one_scope_design("repeat");
    let count = design.add_signal("count", t8);
    design.add_scope_inner(scope, count);
    design.set_signal_value(count, build::value_numeric(t8, 0));

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::time_wait(1, TimeUnit::Ps),
                build::time_repeat(
                    7,
                    build::transmit(
                        build::sig_ref(count),
                        build::binary(
                            BinaryOp::Add,
                            build::sig(count),
                            build::value_numeric(t8, 1),
                        ),
                    ),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("repeat")).unwrap();
    sim.run();

    let p = sim.find_port("count").unwrap();
    assert_eq!(sim.read_port(p), 7);
}

#[test]
fn test_ref_concat_transmit_splits_by_width() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let t8 = Type::vector(bit, 8);
    let (mut design, top, scope) = one_scope_design("refconcat");
    let hi = design.add_signal("hi", t4);
    let lo = design.add_signal("lo", t4);
    design.add_scope_inner(scope, hi);
    design.add_scope_inner(scope, lo);

    // {hi, lo} <= 0xa5 : big direction, first member takes the high bits.
    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::transmit(
                    build::ref_concat(
                        t8,
                        volt_core::logic::ConcatDir::Big,
                        vec![build::sig_ref(hi), build::sig_ref(lo)],
                    ),
                    build::value_numeric(t8, 0xa5),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("refconcat")).unwrap();
    sim.run();

    let hi_port = sim.find_port("hi").unwrap();
    let lo_port = sim.find_port("lo").unwrap();
    assert_eq!(sim.read_port(hi_port), 0xa);
    assert_eq!(sim.read_port(lo_port), 0x5);
}

#[test]
fn test_indexed_write_and_read() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let (mut design, top, scope) = one_scope_design("index");
    let v = design.add_signal("v", t4);
    let o = design.add_signal("o", bit);
    design.add_scope_inner(scope, v);
    design.add_scope_inner(scope, o);
    design.set_signal_value(v, build::value_numeric(t4, 0));

    // v[2] <= 1, then o <= v[2].
    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::transmit(
                    build::ref_index(bit, build::value_numeric(t4, 2), build::sig_ref(v)),
                    build::value_numeric(bit, 1),
                ),
                build::transmit(
                    build::sig_ref(o),
                    build::expr_ref(build::ref_index(
                        bit,
                        build::value_numeric(t4, 2),
                        build::sig_ref(v),
                    )),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("index")).unwrap();
    sim.run();

    let v_port = sim.find_port("v").unwrap();
    let o_port = sim.find_port("o").unwrap();
    assert_eq!(sim.read_port(v_port), 0b0100);
    assert_eq!(sim.read_port(o_port), 1);
}

#[test]
fn test_port_write_feeds_subscribers() {
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("ports");
    let input = design.add_signal("input", bit);
    let echoed = design.add_signal("echoed", bit);
    design.add_system_input(top, input);
    design.add_system_output(top, echoed);

    let follow = design.add_behavior(false);
    design.add_scope_behavior(scope, follow);
    design.add_behavior_event(follow, Edge::Any, input);
    design.set_behavior_block(
        follow,
        build::block(
            BlockMode::Seq,
            vec![build::transmit(build::sig_ref(echoed), build::sig(input))],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("ports")).unwrap();
    sim.run();

    let input_port = sim.find_port("input").unwrap();
    let echoed_port = sim.find_port("echoed").unwrap();
    sim.write_port(input_port, 1);
    sim.propagate();
    assert_eq!(sim.read_port(echoed_port), 1);
}

#[test]
fn test_code_hook_runs_on_edge() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("code");
    let clk = design.add_signal("clk", bit);
    design.add_scope_inner(scope, clk);

    let seen = Arc::new(AtomicU64::new(0));
    let seen_in_hook = Arc::clone(&seen);
    let code = design.add_code(Box::new(move |ports: &mut volt_sim::PortAccess<'_>| {
        let clk = ports.find_port("clk").unwrap();
        seen_in_hook.fetch_add(ports.read_port(clk), Ordering::SeqCst);
    }));
    design.add_scope_code(scope, code);
    design.add_code_event(code, Edge::Pos, clk);

    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    design.set_behavior_block(
        driver,
        build::block(
            BlockMode::Par,
            vec![
                build::transmit(build::sig_ref(clk), build::value_numeric(bit, 1)),
                build::time_wait(5, TimeUnit::Ps),
                build::transmit(build::sig_ref(clk), build::value_numeric(bit, 0)),
                build::time_wait(5, TimeUnit::Ps),
                build::transmit(build::sig_ref(clk), build::value_numeric(bit, 1)),
                build::time_wait(5, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("code")).unwrap();
    sim.run();

    // The hook observed the two rising edges.
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_current_equals_future_after_propagation() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let (mut design, top, scope) = one_scope_design("quiescent");
    let a = design.add_signal("a", t4);
    let b = design.add_signal("b", t4);
    design.add_scope_inner(scope, a);
    design.add_scope_inner(scope, b);

    let follow = design.add_behavior(false);
    design.add_scope_behavior(scope, follow);
    design.add_behavior_event(follow, Edge::Any, a);
    design.set_behavior_block(
        follow,
        build::block(
            BlockMode::Par,
            vec![build::transmit(build::sig_ref(b), build::sig(a))],
        ),
    );

    let driver = design.add_behavior(true);
    design.add_scope_behavior(scope, driver);
    design.set_behavior_block(
        driver,
        build::block(
            BlockMode::Par,
            vec![
                build::transmit(build::sig_ref(a), build::value_numeric(t4, 9)),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("quiescent")).unwrap();
    sim.run();

    // After propagation reaches fixed point, current == future everywhere.
    for name in ["a", "b"] {
        let p = sim.find_port(name).unwrap();
        assert!(sim.with_ports(|ports| ports.is_settled(p)));
        assert_eq!(sim.read_port(p), 9);
    }
}

#[test]
fn test_select_expression_picks_choice() {
    let bit = Type::bit();
    let t4 = Type::vector(bit, 4);
    let (mut design, top, scope) = one_scope_design("select");
    let out = design.add_signal("out", t4);
    design.add_scope_inner(scope, out);

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::transmit(
                    build::sig_ref(out),
                    build::select(
                        t4,
                        build::value_numeric(bit, 1),
                        vec![
                            build::value_numeric(t4, 3),
                            build::value_numeric(t4, 9),
                        ],
                    ),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("select")).unwrap();
    sim.run();

    let out_port = sim.find_port("out").unwrap();
    assert_eq!(sim.read_port(out_port), 9);
}

#[test]
fn test_print_statement_executes() {
    let t4 = Type::vector(Type::bit(), 4);
    let (mut design, top, scope) = one_scope_design("print");
    let v = design.add_signal("v", t4);
    design.add_scope_inner(scope, v);
    design.set_signal_value(v, build::value_numeric(t4, 5));

    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::time_wait(1, TimeUnit::Ps),
                build::print(vec![
                    build::string_e("v = "),
                    build::sig(v),
                    build::string_e("\n"),
                ]),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("print")).unwrap();
    sim.run();
    assert_eq!(sim.time(), 2);
}

#[test]
fn test_four_state_expression_through_signals() {
    let t4 = Type::vector(Type::bit(), 4);
    let bit = Type::bit();
    let (mut design, top, scope) = one_scope_design("fourstate");
    let x = design.add_signal("x", t4);
    let r = design.add_signal("r", bit);
    design.add_scope_inner(scope, x);
    design.add_scope_inner(scope, r);

    // x <= ("10x1" ^ "1111") & "00x0"; r <= |x. The reduction stays x.
    let beh = design.add_behavior(true);
    design.add_scope_behavior(scope, beh);
    let xor = build::binary(
        BinaryOp::Xor,
        build::value_bitstring(t4, "10x1").unwrap(),
        build::value_bitstring(t4, "1111").unwrap(),
    );
    let and = build::binary(BinaryOp::And, xor, build::value_bitstring(t4, "00x0").unwrap());
    design.set_behavior_block(
        beh,
        build::block(
            BlockMode::Seq,
            vec![
                build::transmit(build::sig_ref(x), and),
                build::transmit(
                    build::sig_ref(r),
                    build::unary(volt_sim::ir::UnaryOp::ReduceOr, build::sig(x)),
                ),
                build::time_wait(1, TimeUnit::Ps),
            ],
        ),
    );

    let mut sim = Simulator::new(design, top, mute("fourstate")).unwrap();
    sim.run();

    let x_port = sim.find_port("x").unwrap();
    let r_port = sim.find_port("r").unwrap();
    let xv = sim.with_ports(|p| p.read_port_value(x_port));
    let rv = sim.with_ports(|p| p.read_port_value(r_port));
    assert_eq!(xv.to_bit_string(), "00x0");
    assert_eq!(rv.to_bit_string(), "x");
}
