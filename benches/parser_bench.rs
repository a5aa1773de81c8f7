#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use domtrip::serial::serialize;
use domtrip::{Config, Document};
use std::fmt::Write;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small document with approximately 10 elements.
fn make_small_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a POM-like document with approximately 400 elements.
fn make_pom_xml() -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n\
         \x20   <modelVersion>4.0.0</modelVersion>\n\
         \x20   <!-- dependencies -->\n\
         \x20   <dependencies>\n",
    );
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "        <dependency>\n\
             \x20           <groupId>org.example.g{i}</groupId>\n\
             \x20           <artifactId>artifact-{i}</artifactId>\n\
             \x20           <version>1.{i}.0</version>\n\
             \x20       </dependency>"
        );
    }
    xml.push_str("    </dependencies>\n</project>\n");
    xml
}

/// Generates a large document with approximately 4000 elements.
fn make_large_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id='{i}'><name>Record {i} &amp; co</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a deeply nested document with the given nesting depth.
fn make_nested_xml(depth: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n");
    for i in 0..depth {
        let _ = write!(xml, "<level{i}>");
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml.push('\n');
    xml
}

/// Generates a document where each element has `num_attrs` attributes.
fn make_attr_heavy_xml(num_attrs: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<root>\n");
    for i in 0..10 {
        let _ = write!(xml, "  <element");
        for j in 0..num_attrs {
            let _ = write!(xml, " attr{j}=\"value_{i}_{j}\"");
        }
        xml.push_str("/>\n");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a document with many namespace declarations and prefixed
/// elements.
fn make_namespace_heavy_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<root");
    for i in 0..20 {
        let _ = write!(xml, " xmlns:ns{i}=\"http://example.com/ns{i}\"");
    }
    xml.push_str(">\n");
    for i in 0..100 {
        let ns = i % 20;
        let _ = writeln!(
            xml,
            "  <ns{ns}:item ns{ns}:id=\"{i}\">Content {i}</ns{ns}:item>"
        );
    }
    xml.push_str("</root>\n");
    xml
}

// ---------------------------------------------------------------------------
// Parsing benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_small(c: &mut Criterion) {
    let xml = make_small_xml();
    c.bench_function("parse_small", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_pom(c: &mut Criterion) {
    let xml = make_pom_xml();
    c.bench_function("parse_pom", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let xml = make_large_xml();
    c.bench_function("parse_large", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_bytes(c: &mut Criterion) {
    let xml = make_large_xml();
    c.bench_function("parse_bytes", |b| {
        b.iter(|| Document::parse_bytes(black_box(xml.as_bytes())));
    });
}

fn bench_parse_deeply_nested(c: &mut Criterion) {
    let xml = make_nested_xml(50);
    c.bench_function("parse_deeply_nested", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_many_attributes(c: &mut Criterion) {
    let xml = make_attr_heavy_xml(50);
    c.bench_function("parse_many_attributes", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

fn bench_parse_namespace_heavy(c: &mut Criterion) {
    let xml = make_namespace_heavy_xml();
    c.bench_function("parse_namespace_heavy", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

// ---------------------------------------------------------------------------
// Serialization benchmarks
// ---------------------------------------------------------------------------

fn bench_serialize_small(c: &mut Criterion) {
    let xml = make_small_xml();
    let doc = Document::parse_str(&xml).expect("failed to parse small XML");
    let config = Config::defaults();
    c.bench_function("serialize_small", |b| {
        b.iter(|| serialize(black_box(&doc), &config));
    });
}

fn bench_serialize_large(c: &mut Criterion) {
    let xml = make_large_xml();
    let doc = Document::parse_str(&xml).expect("failed to parse large XML");
    let config = Config::defaults();
    c.bench_function("serialize_large", |b| {
        b.iter(|| serialize(black_box(&doc), &config));
    });
}

fn bench_serialize_pretty(c: &mut Criterion) {
    let xml = make_large_xml();
    let doc = Document::parse_str(&xml).expect("failed to parse large XML");
    let config = Config::pretty_print();
    c.bench_function("serialize_pretty", |b| {
        b.iter(|| serialize(black_box(&doc), &config));
    });
}

// ---------------------------------------------------------------------------
// Editing benchmarks
// ---------------------------------------------------------------------------

fn bench_edit_versions(c: &mut Criterion) {
    let xml = make_pom_xml();
    c.bench_function("edit_versions", |b| {
        b.iter(|| {
            let mut doc = Document::parse_str(black_box(&xml)).expect("parse failed");
            let versions: Vec<_> = doc.descendant_elements(doc.root(), "version").collect();
            for id in versions {
                doc.set_text(id, "2.0.0").expect("set_text failed");
            }
            black_box(doc.to_xml())
        });
    });
}

fn bench_append_children(c: &mut Criterion) {
    let xml = make_pom_xml();
    c.bench_function("append_children", |b| {
        b.iter(|| {
            let mut doc = Document::parse_str(black_box(&xml)).expect("parse failed");
            let root = doc.root_element().expect("no root");
            let deps = doc.child_element(root, "dependencies").expect("no dependencies");
            for i in 0..20 {
                let dep = doc.create_element("dependency").expect("bad name");
                let id = doc
                    .create_element_with_text("artifactId", &format!("new-{i}"))
                    .expect("bad name");
                doc.append_child(dep, id).expect("append failed");
                doc.append_child(deps, dep).expect("append failed");
            }
            black_box(doc.to_xml())
        });
    });
}

// ---------------------------------------------------------------------------
// Roundtrip benchmark: parse -> serialize -> parse
// ---------------------------------------------------------------------------

fn bench_roundtrip(c: &mut Criterion) {
    let xml = make_pom_xml();
    c.bench_function("roundtrip", |b| {
        b.iter(|| {
            let doc = Document::parse_str(black_box(&xml)).expect("parse failed");
            let serialized = doc.to_xml();
            let doc2 = Document::parse_str(&serialized).expect("re-parse failed");
            black_box(doc2);
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    parsing,
    bench_parse_small,
    bench_parse_pom,
    bench_parse_large,
    bench_parse_bytes,
    bench_parse_deeply_nested,
    bench_parse_many_attributes,
    bench_parse_namespace_heavy,
);

criterion_group!(
    serialization,
    bench_serialize_small,
    bench_serialize_large,
    bench_serialize_pretty,
);

criterion_group!(editing, bench_edit_versions, bench_append_children);

criterion_group!(roundtrip, bench_roundtrip);

criterion_main!(parsing, serialization, editing, roundtrip);
