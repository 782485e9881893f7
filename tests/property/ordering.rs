//! Ordering and exclusion invariants over generated providers

use preamble::request::{Exclusion, Request};
use preamble::resolver::resolve;
use preamble::{Bundle, Directive, Position, StaticProvider};
use proptest::prelude::*;

const TARGETS: &[&str] = &["strict", "warnings", "feature", "utf8", "exporter"];

fn position_strategy() -> impl Strategy<Value = Position> {
    prop_oneof![
        Just(Position::Front),
        Just(Position::Normal),
        Just(Position::Back),
    ]
}

/// (target index, position, disable, args)
fn directive_strategy() -> impl Strategy<Value = Directive> {
    (
        0..TARGETS.len(),
        position_strategy(),
        any::<bool>(),
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..4),
    )
        .prop_map(|(target, position, disable, args)| {
            let directive = if disable {
                Directive::disable(TARGETS[target])
            } else {
                Directive::enable(TARGETS[target])
            };
            directive.with_args(args).at(position)
        })
}

fn provider_strategy() -> impl Strategy<Value = StaticProvider> {
    (
        prop::collection::vec(directive_strategy(), 0..6),
        prop::collection::vec(directive_strategy(), 0..6),
        prop::collection::vec(directive_strategy(), 0..6),
    )
        .prop_map(|(always, first, second)| {
            StaticProvider::new("generated")
                .with_always(always)
                .with_bundle(Bundle::new("first", first).unwrap())
                .with_bundle(Bundle::new("second", second).unwrap())
        })
}

fn rank(position: Position) -> u8 {
    match position {
        Position::Front => 0,
        Position::Normal => 1,
        Position::Back => 2,
    }
}

/// Declaration order: always-list, then bundles in request order.
fn declared(provider: &StaticProvider, bundles: &[&str]) -> Vec<Directive> {
    let mut out = provider.always().to_vec();
    for name in bundles {
        out.extend(provider.bundle(name).unwrap().directives().iter().cloned());
    }
    out
}

proptest! {
    #[test]
    fn test_positions_are_grouped(provider in provider_strategy(), swap in any::<bool>()) {
        let bundles = if swap { vec!["second", "first"] } else { vec!["first", "second"] };
        let resolution = resolve(&provider, &Request::new(bundles.clone())).unwrap();
        let ranks: Vec<u8> = resolution.directives().iter().map(|d| rank(d.position())).collect();
        prop_assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert_eq!(resolution.len(), declared(&provider, &bundles).len());
    }

    #[test]
    fn test_partition_is_stable(provider in provider_strategy()) {
        let bundles = ["first", "second"];
        let resolution = resolve(&provider, &Request::new(bundles)).unwrap();
        let declared = declared(&provider, &bundles);

        for position in [Position::Front, Position::Normal, Position::Back] {
            let expected: Vec<String> = declared
                .iter()
                .filter(|d| d.position() == position)
                .map(|d| d.to_string())
                .collect();
            let actual: Vec<String> = resolution
                .directives()
                .iter()
                .filter(|d| d.position() == position)
                .map(|d| d.to_string())
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_whole_exclusion_keeps_relative_order(
        provider in provider_strategy(),
        excluded in prop::sample::select(TARGETS.to_vec()),
    ) {
        let bundles = ["first", "second"];
        let full = resolve(&provider, &Request::new(bundles)).unwrap();
        let filtered = resolve(
            &provider,
            &Request::new(bundles).exclude(Exclusion::whole(excluded)),
        )
        .unwrap();

        let expected: Vec<String> = full
            .directives()
            .iter()
            .filter(|d| d.target() != Some(excluded))
            .map(|d| d.to_string())
            .collect();
        let actual: Vec<String> = filtered.directives().iter().map(|d| d.to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_sub_item_exclusion_never_drops_directives(
        provider in provider_strategy(),
        excluded in prop::sample::select(TARGETS.to_vec()),
    ) {
        let bundles = ["first", "second"];
        let full = resolve(&provider, &Request::new(bundles)).unwrap();
        let narrowed = resolve(
            &provider,
            &Request::new(bundles).exclude(Exclusion::items(excluded, ["a", "b", "c"])),
        )
        .unwrap();

        prop_assert_eq!(full.len(), narrowed.len());
        for (before, after) in full.directives().iter().zip(narrowed.directives()) {
            prop_assert_eq!(before.target(), after.target());
            prop_assert_eq!(before.position(), after.position());
            if before.target() == Some(excluded) {
                prop_assert!(after.args().is_empty());
            } else {
                prop_assert_eq!(before.args(), after.args());
            }
        }
    }
}

#[test]
fn test_duplicates_are_preserved() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&(1usize..5), |copies| {
            let provider = StaticProvider::new("dup")
                .with_always(vec![Directive::enable("strict"); copies]);
            let resolution = resolve(&provider, &Request::default()).unwrap();
            assert_eq!(resolution.len(), copies);
            Ok(())
        })
        .unwrap();
}
