//! Integration tests parsing real-world XML formats.
//!
//! These serve as smoke tests ensuring the parser handles common patterns
//! found in Atom feeds, SVG, Maven POMs, Android manifests and game
//! configuration files, and that every one of them survives a round trip.

#![allow(clippy::unwrap_used)]

use slimxml::serial::serialize;
use slimxml::{Document, NodeId, NodeKind};

/// Asserts that two subtrees have the same kinds, names, values and
/// attributes, in the same order.
fn assert_same_tree(a: &Document, a_id: NodeId, b: &Document, b_id: NodeId) {
    assert_eq!(a.kind(a_id), b.kind(b_id));
    assert_eq!(a.name(a_id), b.name(b_id));
    assert_eq!(a.value(a_id), b.value(b_id), "value of <{}>", a.name(a_id));
    assert_eq!(
        a.node(a_id).attributes(),
        b.node(b_id).attributes(),
        "attributes of <{}>",
        a.name(a_id)
    );
    assert_eq!(
        a.child_count(a_id),
        b.child_count(b_id),
        "children of <{}>",
        a.name(a_id)
    );
    for (ca, cb) in a.children(a_id).zip(b.children(b_id)) {
        assert_same_tree(a, ca, b, cb);
    }
}

fn parse_and_roundtrip(input: &str) -> Document {
    let doc = Document::parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}"));
    let output = serialize(&doc);
    let doc2 =
        Document::parse_str(&output).unwrap_or_else(|e| panic!("roundtrip parse failed: {e}"));
    assert_same_tree(&doc, doc.root(), &doc2, doc2.root());
    doc
}

fn root_element(doc: &Document) -> NodeId {
    doc.children(doc.root())
        .find(|&id| doc.kind(id) == NodeKind::Element)
        .unwrap()
}

// --- Atom / RSS ---

#[test]
fn test_atom_feed() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <link href="http://example.org/"/>
  <updated>2025-12-13T18:30:02Z</updated>
  <author>
    <name>John Doe</name>
  </author>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <link href="http://example.org/2003/12/13/atom03"/>
    <summary>Some text &amp; more.</summary>
  </entry>
</feed>"#;

    let doc = parse_and_roundtrip(xml);
    let feed = root_element(&doc);
    assert_eq!(doc.name(feed), "feed");
    assert_eq!(
        doc.attribute(feed, "xmlns"),
        Some("http://www.w3.org/2005/Atom")
    );
    let entry = doc.find_child(feed, "entry").unwrap();
    let summary = doc.find_child(entry, "summary").unwrap();
    assert_eq!(doc.value(summary), "Some text & more.");
    assert_eq!(doc.child_count_named(feed, "link"), 1);
    assert!(doc.diagnostics.is_empty());
}

// --- SVG ---

#[test]
fn test_svg_with_comments_and_doctype() {
    let xml = r#"<?xml version="1.0" standalone="no"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg width="100" height="100" viewBox="0 0 100 100">
  <!-- a circle > a square -->
  <circle cx="50" cy="50" r="40" stroke="green" stroke-width="4" fill="yellow"/>
  <path d="M 10 10 L 90 90"/>
</svg>"#;

    let doc = parse_and_roundtrip(xml);
    let svg = root_element(&doc);
    let mut view_box = [0; 4];
    doc.node(svg)
        .read_attribute_as_int_array("viewBox", &mut view_box, -1);
    assert_eq!(view_box, [0, 0, 100, 100]);

    let comment = doc.first_child(svg).unwrap();
    assert_eq!(doc.kind(comment), NodeKind::Comment);
    assert_eq!(doc.value(comment), " a circle > a square ");

    let circle = doc.find_child(svg, "circle").unwrap();
    assert_eq!(doc.node(circle).read_attribute("r", 0).as_int(), 40);

    // The DOCTYPE is skipped with a warning.
    assert_eq!(doc.diagnostics.len(), 1);
}

// --- Maven POM ---

#[test]
fn test_maven_pom() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
    </dependency>
  </dependencies>
</project>"#;

    let doc = parse_and_roundtrip(xml);
    let project = root_element(&doc);
    let deps = doc.find_child(project, "dependencies").unwrap();
    let ids: Vec<&str> = doc
        .find_children(deps, "dependency")
        .map(|dep| doc.value(doc.find_child(dep, "artifactId").unwrap()))
        .collect();
    assert_eq!(ids, vec!["junit", "slf4j-api"]);
}

// --- Android manifest ---

#[test]
fn test_android_manifest() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.app">
  <uses-permission android:name="android.permission.INTERNET"/>
  <application android:label="@string/app_name" android:debuggable='true'>
    <activity android:name=".MainActivity" android:exported="true"/>
  </application>
</manifest>"#;

    let doc = parse_and_roundtrip(xml);
    let manifest = root_element(&doc);
    let app = doc.find_child(manifest, "application").unwrap();
    assert!(doc
        .node(app)
        .read_attribute("android:debuggable", false)
        .as_bool());
    let activity = doc.find_child(app, "activity").unwrap();
    assert_eq!(
        doc.attribute(activity, "android:name"),
        Some(".MainActivity")
    );
}

// --- Game configuration ---

#[test]
fn test_game_config() {
    let xml = r#"<config>
	<window width="1280" height="720" fullscreen="FALSE" scale="1.5"/>
	<colors background="FF202020" highlight="ffcc00"/>
	<renderer mode="Deferred" shadows="2 4 8"/>
	<keys><jump>Space</jump><fire>Ctrl</fire></keys>
</config>"#;

    let doc = parse_and_roundtrip(xml);
    let config = root_element(&doc);

    let window = doc.node(doc.find_child(config, "window").unwrap());
    assert_eq!(window.read_attribute("width", 0).as_int(), 1280);
    assert!(!window.read_attribute("fullscreen", true).as_bool());
    assert!((window.read_attribute("scale", 1.0).as_float() - 1.5).abs() < f64::EPSILON);

    let colors = doc.node(doc.find_child(config, "colors").unwrap());
    assert_eq!(colors.read_attribute_as_hex("background", 0), 0xFF20_2020);
    assert_eq!(colors.read_attribute_as_hex("highlight", 0), 0xFFCC00);

    let renderer = doc.node(doc.find_child(config, "renderer").unwrap());
    let modes = ["Forward", "Deferred"];
    assert_eq!(renderer.read_attribute_as_enum("mode", &modes, 0), 1);
    let mut cascades = [0; 4];
    renderer.read_attribute_as_int_array("shadows", &mut cascades, 16);
    assert_eq!(cascades, [2, 4, 8, 16]);

    let keys = doc.find_child(config, "keys").unwrap();
    assert_eq!(doc.value(doc.find_child(keys, "fire").unwrap()), "Ctrl");
}

// --- Sloppy hand-written files ---

#[test]
fn test_hand_written_file_with_mistakes() {
    let xml = "<settings>\n  <volume level=80/>\n  <name>Player</nmae>\n  <lang code=\"en\">\n</settings>";
    let doc = Document::parse_str(xml).unwrap();
    let settings = root_element(&doc);
    let volume = doc.find_child(settings, "volume").unwrap();
    assert_eq!(doc.attribute(volume, "level"), Some("80"));
    // `</nmae>` closes <name> with an error; `</settings>` then closes <lang>.
    assert!(doc.find_child(settings, "lang").is_some());
    assert!(doc.diagnostics.len() >= 2);
}
