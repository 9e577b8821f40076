use std::fs;

use crate::document::BlockDocument;
use crate::manifest::{ManifestDefaults, SectionAction};
use crate::store::TranslationRecord;

use super::block_stream::table_to_text;
use super::run::{StorePaths, extract_to_stores, extract_units, store_file_name};
use super::*;

fn rules() -> HeadingRules {
    HeadingRules::new().expect("heading rules compile")
}

fn scenario_stream() -> Vec<Item> {
    vec![
        Item::heading("Heading A", 1),
        Item::paragraph("Hello"),
        Item::heading("Heading B", 1),
        Item::paragraph("World"),
    ]
}

fn section(id: &str, kind: AnchorType, candidates: &[&str]) -> SectionDescriptor {
    SectionDescriptor::new(
        id,
        Anchor::new(kind, candidates.iter().copied()),
        SectionAction::Import,
    )
}

fn manifest(sections: Vec<SectionDescriptor>) -> Manifest {
    Manifest {
        defaults: ManifestDefaults::default(),
        sections,
    }
}

fn range(section_id: &str, start: usize, end: usize) -> SectionRange {
    SectionRange {
        section_id: section_id.to_string(),
        start,
        end,
    }
}

fn scenario_document() -> BlockDocument {
    BlockDocument::new(vec![
        Block::paragraph("Heading A", Some("Heading 1")),
        Block::paragraph("Hello", None),
        Block::paragraph("Heading B", Some("Heading 1")),
        Block::paragraph("World", None),
    ])
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "doc-l10n-extract-{}-{name}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir is creatable");
    dir
}

fn translated_heading_store() -> TranslationStore {
    let (store, _) = TranslationStore::from_rows(vec![TranslationRecord {
        location: "doc.sA.u0001".to_string(),
        context: "sA|heading|l1".to_string(),
        source: "Heading A".to_string(),
        target: "Kop A".to_string(),
    }]);
    store
}

fn unit(key: &str, source: &str) -> Unit {
    Unit {
        key: key.to_string(),
        context: "s|paragraph".to_string(),
        source: source.to_string(),
    }
}

#[test]
fn heading_rules_detect_localized_styles_and_levels() {
    let rules = rules();
    assert_eq!(rules.heading_level(Some("Heading 2")), Some(2));
    assert_eq!(rules.heading_level(Some("heading3")), Some(3));
    assert_eq!(rules.heading_level(Some("Kop 4")), Some(4));
    assert_eq!(rules.heading_level(Some("Title")), Some(1));
    assert_eq!(rules.heading_level(Some("Titel")), Some(1));
    assert_eq!(rules.heading_level(Some("Heading 12")), Some(1));
    assert_eq!(rules.heading_level(Some("Normal")), None);
    assert_eq!(rules.heading_level(Some("Subtitle")), None);
    assert_eq!(rules.heading_level(None), None);
}

#[test]
fn build_stream_follows_document_order_and_keeps_empty_blocks() {
    let document = BlockDocument::new(vec![
        Block::paragraph("  Heading\u{00a0} A ", Some("Heading 1")),
        Block::paragraph("", Some("Normal")),
        Block::Table {
            rows: vec![
                vec![
                    TableCell::new(["Area"]),
                    TableCell::new(["Level", "  detail "]),
                ],
                vec![TableCell::new(["1"]), TableCell::new(["Basic"])],
            ],
        },
        Block::paragraph("Body   text", None),
    ]);

    let stream = build_stream(&document, &StreamOptions::default(), &rules());

    assert_eq!(stream.len(), 4);
    assert_eq!(stream[0], Item::heading("Heading A", 1));
    assert_eq!(stream[1], Item::paragraph(""));
    assert_eq!(
        stream[2],
        Item::table("TABLE:\nArea\tLevel\ndetail\n1\tBasic", 2, 2)
    );
    assert_eq!(stream[3], Item::paragraph("Body text"));
}

#[test]
fn reordering_blocks_reorders_items_identically() {
    let first = Block::paragraph("First", None);
    let second = Block::paragraph("Second", Some("Heading 2"));
    let forward = BlockDocument::new(vec![first.clone(), second.clone()]);
    let backward = BlockDocument::new(vec![second, first]);

    let options = StreamOptions::default();
    let forward_stream = build_stream(&forward, &options, &rules());
    let mut backward_stream = build_stream(&backward, &options, &rules());
    backward_stream.reverse();

    assert_eq!(forward_stream, backward_stream);
}

#[test]
fn build_stream_skips_tables_when_disabled_and_supports_pipe_format() {
    let rows = vec![vec![TableCell::new(["a"]), TableCell::new(["b"])]];
    let document = BlockDocument::new(vec![Block::Table { rows: rows.clone() }]);
    let options = StreamOptions {
        include_tables: false,
        ..StreamOptions::default()
    };

    assert!(build_stream(&document, &options, &rules()).is_empty());
    assert_eq!(table_to_text(&rows, TableFormat::parse("pipe")), "a | b");
    assert_eq!(TableFormat::parse(" TSV "), TableFormat::Tsv);

    let unprefixed = StreamOptions {
        table_prefix: String::new(),
        ..StreamOptions::default()
    };
    assert_eq!(
        build_stream(&document, &unprefixed, &rules())[0].text,
        "a\tb"
    );
}

#[test]
fn locate_start_of_document_is_index_zero() {
    assert_eq!(
        locate(&scenario_stream(), &Anchor::start_of_document()),
        Some(0)
    );
    assert_eq!(locate(&[], &Anchor::start_of_document()), Some(0));
    assert_eq!(
        locate(
            &scenario_stream(),
            &Anchor::new(AnchorType::StartOfDocument, ["  "])
        ),
        Some(0)
    );
}

#[test]
fn locate_prefers_headings_before_falling_back_to_paragraphs() {
    let stream = vec![
        Item::paragraph("See the Glossary for terms"),
        Item::heading("Glossary", 1),
        Item::paragraph("Annex overview"),
    ];

    let heading = Anchor::new(AnchorType::HeadingContains, ["glossary"]);
    assert_eq!(locate(&stream, &heading), Some(1));

    let paragraph = Anchor::new(AnchorType::ParagraphContains, ["GLOSSARY"]);
    assert_eq!(locate(&stream, &paragraph), Some(0));

    let fallback = Anchor::new(AnchorType::HeadingText, ["annex   overview"]);
    assert_eq!(locate(&stream, &fallback), Some(2));
}

#[test]
fn locate_heading_text_requires_exact_match() {
    let stream = vec![Item::heading("Introduction to the framework", 1)];
    let exact = Anchor::new(AnchorType::HeadingText, ["introduction"]);
    let contains = Anchor::new(AnchorType::HeadingContains, ["introduction"]);

    assert_eq!(locate(&stream, &exact), None);
    assert_eq!(locate(&stream, &contains), Some(0));
}

#[test]
fn locate_returns_earliest_item_regardless_of_candidate_order() {
    let stream = vec![
        Item::heading("Overview", 1),
        Item::heading("Competences", 1),
        Item::heading("Areas", 1),
    ];
    let anchor = Anchor::new(AnchorType::HeadingText, ["areas", "competences"]);

    assert_eq!(locate(&stream, &anchor), Some(1));
    assert_eq!(locate(&stream, &anchor), locate(&stream, &anchor));
}

#[test]
fn locate_without_usable_candidates_or_match_is_not_found() {
    let stream = scenario_stream();
    let blank = Anchor::new(AnchorType::HeadingContains, ["   "]);
    let absent = Anchor::new(AnchorType::ParagraphContains, ["absent"]);

    assert_eq!(locate(&stream, &blank), None);
    assert_eq!(locate(&stream, &absent), None);
}

#[test]
fn compute_ranges_partitions_scenario_stream() {
    let sections = vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("sB", AnchorType::HeadingContains, &["heading b"]),
    ];

    let ranges = compute_ranges(&scenario_stream(), &sections);

    assert_eq!(ranges.ranges, vec![range("sA", 0, 2), range("sB", 2, 4)]);
    assert!(ranges.unresolved.is_empty());
    assert!(ranges.order_violations().is_empty());
}

#[test]
fn compute_ranges_leaves_no_gap_between_resolved_anchors() {
    let stream = (0..10)
        .map(|index| {
            if index % 3 == 0 {
                Item::heading(format!("Part {index}"), 1)
            } else {
                Item::paragraph(format!("text {index}"))
            }
        })
        .collect::<Vec<Item>>();
    let sections = vec![
        section("p6", AnchorType::HeadingText, &["part 6"]),
        section("p0", AnchorType::HeadingText, &["part 0"]),
        section("p3", AnchorType::HeadingText, &["part 3"]),
        section("p9", AnchorType::HeadingText, &["part 9"]),
    ];

    let ranges = compute_ranges(&stream, &sections);

    assert_eq!(
        ranges.ranges,
        vec![
            range("p0", 0, 3),
            range("p3", 3, 6),
            range("p6", 6, 9),
            range("p9", 9, 10),
        ]
    );
    for pair in ranges.ranges.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(ranges.order_violations(), vec!["p6".to_string()]);
}

#[test]
fn unresolved_sections_do_not_extend_resolved_ranges() {
    let sections = vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("ghost", AnchorType::HeadingContains, &["not there"]),
        SectionDescriptor {
            anchor: None,
            ..section("bare", AnchorType::HeadingContains, &[])
        },
        section("sB", AnchorType::HeadingContains, &["heading b"]),
    ];

    let ranges = compute_ranges(&scenario_stream(), &sections);

    assert_eq!(ranges.ranges, vec![range("sA", 0, 2), range("sB", 2, 4)]);
    assert_eq!(
        ranges.unresolved,
        vec!["ghost".to_string(), "bare".to_string()]
    );
}

#[test]
fn sections_sharing_an_anchor_are_reported() {
    let sections = vec![
        section("second", AnchorType::HeadingContains, &["heading"]),
        section("first", AnchorType::HeadingContains, &["heading a"]),
    ];

    let ranges = compute_ranges(&scenario_stream(), &sections);

    assert_eq!(
        ranges.ranges,
        vec![range("first", 0, 0), range("second", 0, 4)]
    );
    let shared = ranges.shared_starts();
    assert_eq!(
        shared.get(&0),
        Some(&vec!["first".to_string(), "second".to_string()])
    );
}

#[test]
fn ignored_sections_still_bound_the_previous_section() {
    let mut skipped = section("skip", AnchorType::HeadingContains, &["heading b"]);
    skipped.action = SectionAction::Ignore;
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        skipped,
    ]);

    let extraction = extract_units(&scenario_stream(), &manifest, &SegmentOptions::default())
        .expect("extraction succeeds");

    let keys = extraction
        .units
        .iter()
        .map(|unit| unit.key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["doc.sA.u0001", "doc.sA.u0002"]);
}

#[test]
fn atomic_units_number_per_section_and_skip_empty_items() {
    let stream = vec![
        Item::heading("Intro", 2),
        Item::paragraph(""),
        Item::paragraph("first line\nwrapped tail"),
        Item::table("TABLE:\na\tb\nc\td", 2, 2),
    ];
    let descriptor = section("intro", AnchorType::StartOfDocument, &[]);

    let units = atomic_units(&descriptor, &stream, true);

    assert_eq!(
        units,
        vec![
            Unit {
                key: "doc.intro.u0001".to_string(),
                context: "intro|heading|l2".to_string(),
                source: "Intro".to_string(),
            },
            Unit {
                key: "doc.intro.u0002".to_string(),
                context: "intro|paragraph".to_string(),
                source: "first line wrapped tail".to_string(),
            },
            Unit {
                key: "doc.intro.u0003".to_string(),
                context: "intro|table".to_string(),
                source: "TABLE:\na\tb\nc\td".to_string(),
            },
        ]
    );

    let unjoined = atomic_units(&descriptor, &stream, false);
    assert_eq!(unjoined[1].source, "first line\nwrapped tail");
}

#[test]
fn atomic_keys_use_each_section_prefix_and_counter() {
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("sB", AnchorType::HeadingContains, &["heading b"]),
    ]);

    let extraction = extract_units(&scenario_stream(), &manifest, &SegmentOptions::default())
        .expect("extraction succeeds");

    let keys = extraction
        .units
        .iter()
        .map(|unit| unit.key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            "doc.sA.u0001",
            "doc.sA.u0002",
            "doc.sB.u0001",
            "doc.sB.u0002",
        ]
    );
    assert_eq!(
        extraction.units_by_section,
        vec![("sA".to_string(), 2), ("sB".to_string(), 2)]
    );
}

#[test]
fn chunk_units_flush_only_after_min_chars() {
    let units = vec![
        unit("k.u0001", "aaaa"),
        unit("k.u0002", "bbbb"),
        unit("k.u0003", "cccc"),
        unit("k.u0004", "   "),
        unit("k.u0005", "dd"),
    ];

    let chunks = chunk_units("s", "k", &units, 10, 5);

    assert_eq!(
        chunks,
        vec![
            Unit {
                key: "k.p001".to_string(),
                context: "s|chunk".to_string(),
                source: "aaaa\n\nbbbb".to_string(),
            },
            Unit {
                key: "k.p002".to_string(),
                context: "s|chunk".to_string(),
                source: "cccc\n\ndd".to_string(),
            },
        ]
    );
}

#[test]
fn chunk_units_let_small_buffers_grow_past_max_chars() {
    let units = vec![unit("k.u0001", "aaaa"), unit("k.u0002", "bbbbbbbbbb")];

    let chunks = chunk_units("s", "k", &units, 8, 6);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source, "aaaa\n\nbbbbbbbbbb");
}

#[test]
fn chunk_units_of_nothing_is_empty() {
    assert!(chunk_units("s", "k", &[], 10, 0).is_empty());
}

#[test]
fn chunked_mode_segments_through_atomic_units() {
    let manifest = manifest(vec![section("sA", AnchorType::StartOfDocument, &[])]);
    let options = SegmentOptions {
        mode: SegmentMode::Chunked,
        max_chars: 12,
        min_chars: 1,
        ..SegmentOptions::default()
    };

    let extraction = extract_units(&scenario_stream(), &manifest, &options)
        .expect("extraction succeeds");

    let sources = extraction
        .units
        .iter()
        .map(|unit| (unit.key.as_str(), unit.source.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        sources,
        vec![
            ("doc.sA.p001", "Heading A"),
            ("doc.sA.p002", "Hello"),
            ("doc.sA.p003", "Heading B"),
            ("doc.sA.p004", "World"),
        ]
    );
}

#[test]
fn hashed_units_suffix_repeated_content_within_a_batch() {
    let stream = vec![
        Item::paragraph("Same text"),
        Item::paragraph("Same text"),
        Item::paragraph("Same text"),
        Item::heading("Same text", 1),
    ];
    let descriptor = section("front", AnchorType::StartOfDocument, &[]);
    let mut context = SegmentContext::default();

    let units = hashed_units(&descriptor, &stream, "doc", true, &mut context);

    let digest = key_digest("front", "paragraph", "Same text");
    let heading_digest = key_digest("front", "heading", "Same text");
    let keys = units
        .iter()
        .map(|unit| unit.key.clone())
        .collect::<Vec<String>>();
    assert_eq!(
        keys,
        vec![
            format!("doc.front.paragraph.{digest}"),
            format!("doc.front.paragraph.{digest}.1"),
            format!("doc.front.paragraph.{digest}.2"),
            format!("doc.front.heading.{heading_digest}"),
        ]
    );
    assert_eq!(units[3].context, "front|heading|l1");
}

#[test]
fn hashed_keys_survive_reordering() {
    let descriptor = section("front", AnchorType::StartOfDocument, &[]);
    let forward = vec![Item::paragraph("one"), Item::paragraph("two")];
    let backward = vec![Item::paragraph("two"), Item::paragraph("one")];

    let forward_units = hashed_units(
        &descriptor,
        &forward,
        "doc",
        true,
        &mut SegmentContext::default(),
    );
    let backward_units = hashed_units(
        &descriptor,
        &backward,
        "doc",
        true,
        &mut SegmentContext::default(),
    );

    assert_eq!(forward_units[0].key, backward_units[1].key);
    assert_eq!(forward_units[1].key, backward_units[0].key);
}

#[test]
fn extract_units_reports_missing_importable_sections() {
    let mut ignored = section("ignored_ghost", AnchorType::HeadingText, &["nowhere"]);
    ignored.action = SectionAction::Ignore;
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("ghost", AnchorType::HeadingText, &["missing heading"]),
        ignored,
    ]);

    let extraction = extract_units(&scenario_stream(), &manifest, &SegmentOptions::default())
        .expect("missing anchors are not fatal");

    assert_eq!(extraction.missing_sections, vec!["ghost".to_string()]);
    assert_eq!(
        extraction.ranges.unresolved,
        vec!["ghost".to_string(), "ignored_ghost".to_string()]
    );
    assert_eq!(extraction.units.len(), 4);
}

#[test]
fn extract_units_rejects_duplicate_keys() {
    let mut second = section("sB", AnchorType::HeadingContains, &["heading b"]);
    second.key_prefix = "doc.sA".to_string();
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        second,
    ]);

    let error = extract_units(&scenario_stream(), &manifest, &SegmentOptions::default())
        .expect_err("duplicate keys are fatal");
    assert!(error.to_string().contains("doc.sA.u0001"));
}

#[test]
fn extraction_is_deterministic() {
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("sB", AnchorType::HeadingContains, &["heading b"]),
    ]);
    let options = SegmentOptions {
        mode: SegmentMode::Hashed,
        ..SegmentOptions::default()
    };

    let first = extract_units(&scenario_stream(), &manifest, &options)
        .expect("first run");
    let second = extract_units(&scenario_stream(), &manifest, &options)
        .expect("second run");

    assert_eq!(first.units, second.units);
}

#[test]
fn store_file_names_follow_language_and_format() {
    assert_eq!(store_file_name("nl", StoreFormat::Json), "nl.json");
    assert_eq!(store_file_name("en", StoreFormat::Sqlite), "en.sqlite");
    assert_eq!(store_file_name("fr", StoreFormat::Csv), "fr.csv");
}

#[test]
fn extract_units_reports_importable_sections_with_empty_ranges() {
    let manifest = manifest(vec![
        section("second", AnchorType::HeadingContains, &["heading"]),
        section("first", AnchorType::HeadingContains, &["heading a"]),
    ]);

    let extraction = extract_units(&scenario_stream(), &manifest, &SegmentOptions::default())
        .expect("empty ranges are not fatal");

    assert_eq!(extraction.empty_sections, vec!["first".to_string()]);
    assert!(extraction.missing_sections.is_empty());
    assert_eq!(extraction.units.len(), 4);
}

#[test]
fn empty_document_is_fatal_and_writes_no_store() {
    let dir = scratch_dir("empty");
    let paths = StorePaths::new(&dir, "en", "nl", StoreFormat::Json);
    let manifest = manifest(vec![section("sA", AnchorType::StartOfDocument, &[])]);

    let error = extract_to_stores(
        &BlockDocument::default(),
        &manifest,
        &StreamOptions::default(),
        &SegmentOptions::default(),
        &paths,
    )
    .expect_err("a document without blocks is rejected");

    assert!(error.to_string().contains("no blocks"));
    assert!(!paths.source.exists());
    assert!(!paths.target.exists());
}

#[test]
fn failed_extraction_leaves_existing_target_store_untouched() {
    let dir = scratch_dir("duplicates");
    let paths = StorePaths::new(&dir, "en", "nl", StoreFormat::Json);
    save_store(&paths.target, &translated_heading_store())
        .expect("prior store is writable");
    let before = fs::read(&paths.target).expect("prior store is readable");

    let mut second = section("sB", AnchorType::HeadingContains, &["heading b"]);
    second.key_prefix = "doc.sA".to_string();
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        second,
    ]);

    let error = extract_to_stores(
        &scenario_document(),
        &manifest,
        &StreamOptions::default(),
        &SegmentOptions::default(),
        &paths,
    )
    .expect_err("duplicate keys are fatal");

    assert!(error.to_string().contains("doc.sA.u0001"));
    assert!(!paths.source.exists());
    assert_eq!(
        fs::read(&paths.target).expect("target store is readable"),
        before
    );
}

#[test]
fn extract_to_stores_writes_both_stores_and_keeps_prior_targets() {
    let dir = scratch_dir("merge");
    let paths = StorePaths::new(&dir, "en", "nl", StoreFormat::Json);
    save_store(&paths.target, &translated_heading_store())
        .expect("prior store is writable");
    let manifest = manifest(vec![
        section("sA", AnchorType::HeadingContains, &["heading a"]),
        section("sB", AnchorType::HeadingContains, &["heading b"]),
    ]);

    let outcome = extract_to_stores(
        &scenario_document(),
        &manifest,
        &StreamOptions::default(),
        &SegmentOptions::default(),
        &paths,
    )
    .expect("extraction succeeds");

    assert_eq!(outcome.stream.len(), 4);
    assert_eq!(outcome.source_rows, 4);
    assert_eq!(outcome.merge.preserved, 1);
    assert_eq!(outcome.merge.new_keys, 3);
    assert_eq!(outcome.rejected_store_rows, 0);

    let source = load_store(&paths.source).expect("source store is readable");
    assert_eq!(source.store.len(), 4);
    assert_eq!(source.store.translated_count(), 0);

    let target = load_store(&paths.target).expect("target store is readable");
    assert_eq!(target.store.len(), 4);
    assert_eq!(
        target
            .store
            .get("doc.sA.u0001")
            .map(|record| record.target.as_str()),
        Some("Kop A")
    );
}
