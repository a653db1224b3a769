//! Property-based tests for probing and diff reporting

use std::convert::Infallible;

use proptest::prelude::*;

use padcell::diff::report::Layout;
use padcell::diff::unified::split_lines;
use padcell::{probe, Classification, DiffReport, Glyphs, ReportLimits};

// ============================================================================
// Strategies
// ============================================================================

/// Short texts over a tiny alphabet with mixed line endings, so diffs hit
/// whitespace-only changes and CRLF/LF differences often.
fn text_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(
            (
                prop::string::string_regex("[ab \t]{0,4}").expect("valid regex"),
                0usize..3,
            ),
            0..12,
        ),
        prop::string::string_regex("[ab ]{0,3}").expect("valid regex"),
    )
        .prop_map(|(lines, tail)| {
            let mut text: String = lines
                .into_iter()
                .map(|(content, ending)| content + ["\n", "\r\n", " \n"][ending])
                .collect();
            text.push_str(&tail);
            text
        })
}

fn body_lines_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..12, 0..30)
}

// ============================================================================
// Helpers
// ============================================================================

fn run(original: &str, max_iterations: usize, f: impl Fn(&str) -> String) -> padcell::Probe {
    probe(original, max_iterations, |s| Ok::<_, Infallible>(f(s))).unwrap()
}

/// Rebuild `expected` from `original` and the rendered hunks alone.
fn apply_rendered(original: &str, rendered: &str) -> String {
    let a = split_lines(original);
    let glyphs = Glyphs::FANCY;
    let mut out = String::new();
    let mut pos = 0;
    let mut cur = 0;

    for line in rendered.split('\n').filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix("@@ -") {
            let range = header.split(' ').next().unwrap();
            let (start, len) = match range.split_once(',') {
                Some((s, "0")) => (s.parse::<usize>().unwrap(), 0),
                Some((s, n)) => (s.parse::<usize>().unwrap() - 1, n.parse::<usize>().unwrap()),
                None => (range.parse::<usize>().unwrap() - 1, 1),
            };
            out.extend(a[pos..start].iter().copied());
            cur = start;
            pos = start + len;
            continue;
        }
        match line.chars().next() {
            Some(' ') => {
                out.push_str(a[cur]);
                cur += 1;
            }
            Some('-') => cur += 1,
            Some('+') => out.push_str(&glyphs.devisualize(&line[1..])),
            other => panic!("unexpected line marker {other:?}"),
        }
    }
    out.extend(a[pos..].iter().copied());
    out
}

fn report_of(bodies: &[usize], limits: ReportLimits) -> DiffReport {
    let mut report = DiffReport::new(limits);
    for (i, lines) in bodies.iter().enumerate() {
        let body: Vec<String> = (0..*lines).map(|n| format!("+{n}")).collect();
        report.add(format!("f{i:03}.txt"), body.join("\n"));
    }
    report
}

/// 0 = diff body, 1 = name only, 2 = count only
fn tier_of(layout: &Layout<'_>, path: &str) -> Option<u8> {
    if layout.sections.iter().any(|s| s.path == path) {
        Some(0)
    } else if layout.named.contains(&path) {
        Some(1)
    } else if layout.counted > 0 {
        Some(2)
    } else {
        None
    }
}

// ============================================================================
// Probing
// ============================================================================

proptest! {
    #[test]
    fn identity_is_well_behaved(content in ".{0,40}", max in 2usize..20) {
        let p = run(&content, max, str::to_string);
        prop_assert_eq!(p.classification(), Classification::WellBehaved);
        prop_assert!(p.is_clean());
        prop_assert!(!p.has_violation());
    }

    #[test]
    fn converged_output_is_a_fixed_point(len in 0usize..12, keep in 0usize..4) {
        let original = "C".repeat(len);
        let shrink = move |s: &str| {
            let mut s = s.to_string();
            if s.len() > keep {
                s.pop();
            }
            s
        };
        let p = run(&original, 20, shrink);
        if len > keep + 1 {
            prop_assert_eq!(p.classification(), Classification::Converge);
        }
        let again = run(p.safe_output(), 20, shrink);
        prop_assert!(again.is_clean());
    }

    #[test]
    fn cycle_period_returns_to_safe_output(period in 2usize..8) {
        let step = move |s: &str| -> String {
            match s.strip_prefix('s').and_then(|n| n.parse::<usize>().ok()) {
                Some(n) => format!("s{}", (n + 1) % period),
                None => "s0".to_string(),
            }
        };
        let p = run("original", 10, step);
        prop_assert_eq!(p.classification(), Classification::Cycle { len: period });
        prop_assert_eq!(p.orbit().len(), period);

        let mut value = p.safe_output().to_string();
        for _ in 0..period {
            value = step(&value);
        }
        prop_assert_eq!(value.as_str(), p.safe_output());
    }

    #[test]
    fn divergence_never_changes_the_file(content in "[a-z]{0,10}", max in 2usize..15) {
        let p = run(&content, max, |s| format!("{s}x"));
        prop_assert_eq!(p.classification(), Classification::Diverge);
        prop_assert_eq!(p.orbit().len(), max);
        prop_assert_eq!(p.safe_output(), content.as_str());
    }

    // ========================================================================
    // Diff rendering
    // ========================================================================

    #[test]
    fn rendered_hunks_reproduce_expected(original in text_strategy(), expected in text_strategy()) {
        let rendered = padcell::diff::render(&original, &expected, &Glyphs::FANCY);
        prop_assert_eq!(rendered.is_empty(), original == expected);
        prop_assert_eq!(apply_rendered(&original, &rendered), expected);
    }

    // ========================================================================
    // Report bounds
    // ========================================================================

    #[test]
    fn report_never_exceeds_line_budget(
        bodies in body_lines_strategy(),
        max_lines in 1usize..60,
        max_files in 1usize..12,
    ) {
        let limits = ReportLimits {
            max_message_lines: max_lines,
            max_files_to_list: max_files,
        };
        let report = report_of(&bodies, limits);
        let layout = report.layout();
        prop_assert!(layout.budget_used() <= max_lines);
        prop_assert!(layout.sections.len() <= max_files);

        for section in &layout.sections {
            let index: usize = section.path[1..4].parse().unwrap();
            prop_assert_eq!(section.body.len() + section.withheld, bodies[index]);
        }

        let rendered = report.render();
        let withheld: usize = layout.sections.iter().map(|s| s.withheld).sum();
        let stated: usize = rendered
            .lines()
            .filter_map(|l| l.trim_start().strip_prefix("... ("))
            .filter_map(|l| l.split(' ').next())
            .map(|n| n.parse::<usize>().unwrap())
            .sum();
        prop_assert_eq!(stated, withheld);
    }

    #[test]
    fn tiers_partition_and_degrade_monotonically(
        bodies in body_lines_strategy(),
        extra in 0usize..12,
        max_lines in 1usize..40,
        max_files in 1usize..6,
    ) {
        let limits = ReportLimits {
            max_message_lines: max_lines,
            max_files_to_list: max_files,
        };
        let small = report_of(&bodies, limits);
        let small_layout = small.layout();
        prop_assert_eq!(
            small_layout.sections.len() + small_layout.named.len() + small_layout.counted,
            bodies.len()
        );

        let mut more = bodies.clone();
        more.push(extra);
        let large = report_of(&more, limits);
        let large_layout = large.layout();

        for path in small.paths() {
            let before = tier_of(&small_layout, path).unwrap();
            let after = tier_of(&large_layout, path).unwrap();
            prop_assert!(after >= before, "{} moved from tier {} to {}", path, before, after);
        }
    }
}
