// End-to-end nested comparison scenarios: texts with fuzzily aligned
// lines and matrices diffed as nested sequences of rows.

use seqdiff::{diff_nested, ChunkSignature, DiffOptions, Signature};

/// Base matrix whose rows share no cell with any other row at the same
/// column (31 and 7 generate distinct residues mod 97 over this range),
/// so row alignment can never latch onto an accidental match.
fn base_matrix(rows: usize, cols: usize) -> Vec<Vec<u32>> {
    (0..rows)
        .map(|r| (0..cols).map(|c| ((r * 31 + c * 7) % 97) as u32).collect())
        .collect()
}

#[test]
fn test_matrix_rows_align_through_cell_edits() {
    let a = base_matrix(10, 10);
    let mut b = a.clone();
    // one cell changed in row 1, two in rows 2..10, row 3 replaced whole
    for r in 1..10 {
        b[r][1] = 111;
    }
    for r in 2..10 {
        b[r][2] = 112;
    }
    b[3] = vec![113; 10];

    let opts = DiffOptions {
        accept: 0.749,
        ..DiffOptions::default()
    };
    let d = diff_nested(&a, &b, &opts).unwrap();

    // only the replaced row fails to align: 2 edits over 20 rows
    assert_eq!(d.ratio, 0.9);

    let sig = d.signature().unwrap();
    assert_eq!(
        sig,
        Signature {
            parts: vec![
                ChunkSignature::aligned(1), // row 0 untouched
                ChunkSignature::aligned(1), // row 1, one cell off
                ChunkSignature::aligned(1), // row 2, two cells off
                ChunkSignature::delta(1, 1), // row 3 replaced
                ChunkSignature::aligned(1),
                ChunkSignature::aligned(1),
                ChunkSignature::aligned(1),
                ChunkSignature::aligned(1),
                ChunkSignature::aligned(1),
                ChunkSignature::aligned(1),
            ],
        }
    );

    let chunks = d.chunks.unwrap();
    assert!(chunks[0].eq && chunks[0].nested.is_none());

    let row1 = chunks[1].nested.as_ref().unwrap();
    assert_eq!(row1.ratio, 0.9);
    let row2 = chunks[2].nested.as_ref().unwrap();
    assert_eq!(row2.ratio, 0.8);

    // the replaced row is an opaque mismatch
    assert!(!chunks[3].eq && chunks[3].nested.is_none());

    for chunk in &chunks[4..] {
        assert_eq!(chunk.nested.as_ref().unwrap().ratio, 0.8);
    }
}

#[test]
fn test_text_diff_with_nested_lines() {
    let a = [
        "fn main() {",
        "    let total = compute();",
        "    println!(\"{total}\");",
        "}",
    ];
    let b = [
        "fn main() {",
        "    let total = compute_all();",
        "    println!(\"{total}\");",
        "}",
    ];
    let opts = DiffOptions {
        accept: 0.7,
        ..DiffOptions::default()
    };
    let d = diff_nested(&a, &b, &opts).unwrap();
    let chunks = d.chunks.as_ref().unwrap();
    assert_eq!(chunks.len(), 3);
    assert!(chunks[0].eq);
    assert!(!chunks[1].eq);
    assert!(chunks[2].eq);

    let line = chunks[1].nested.as_ref().unwrap();
    // "_all" inserted: 4 extra code points over 26 + 30
    assert_eq!(line.ratio, 52.0 / 56.0);
    let line_chunks = line.chunks.as_ref().unwrap();
    assert!(line_chunks
        .iter()
        .all(|c| c.eq || (c.len_a() == 0 && c.len_b() == 4)));
}

#[test]
fn test_coarse_merges_incidental_matches() {
    let a = ["incidental overlap comes from shared short words"];
    let b = ["unrelated text that also uses short words"];
    let opts = DiffOptions {
        accept: 0.3,
        min_ratio: 0.0,
        ..DiffOptions::default()
    };
    let d = diff_nested(&a, &b, &opts).unwrap();
    let chunks = d.chunks.as_ref().unwrap();
    if let Some(line) = chunks[0].nested.as_ref() {
        let coarse = line.get_coarse(4);
        let coarse_chunks = coarse.chunks.as_ref().unwrap();
        // every surviving equal run is longer than the consume threshold
        for chunk in coarse_chunks {
            if chunk.eq {
                assert!(chunk.len_a() > 4);
            }
        }
        assert!(coarse_chunks.len() <= line.chunks.as_ref().unwrap().len());
    }
}

#[test]
fn test_deeply_nested_sequences() {
    let a = vec![vec![vec![1u8, 2, 3], vec![4, 5, 6]]];
    let b = vec![vec![vec![1u8, 2, 9], vec![4, 5, 6]]];
    let opts = DiffOptions {
        accept: 0.5,
        ..DiffOptions::default()
    };
    let d = diff_nested(&a, &b, &opts).unwrap();

    // depth 0: the single outer pair aligns and nests
    let outer = d.chunks.as_ref().unwrap();
    assert_eq!(outer.len(), 1);
    let mid = outer[0].nested.as_ref().unwrap();

    // depth 1: first inner vector differs, second matches
    let mid_chunks = mid.chunks.as_ref().unwrap();
    assert!(!mid_chunks[0].eq);
    assert!(mid_chunks[1].eq);

    // depth 2: the leaf diff pins the changed cell
    let leaf = mid_chunks[0].nested.as_ref().unwrap();
    assert!((leaf.ratio - 4.0 / 6.0).abs() < 1e-12);
    let leaf_chunks = leaf.chunks.as_ref().unwrap();
    assert!(leaf_chunks[0].eq);
    assert_eq!(leaf_chunks[0].a, 0..2);
}

#[test]
fn test_max_depth_stops_recursion() {
    let a = vec![vec![vec![1u8, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]];
    let b = vec![vec![vec![1u8, 2, 3], vec![4, 5, 6], vec![7, 8, 0]]];
    let opts = DiffOptions {
        accept: 0.5,
        max_depth: 2,
        ..DiffOptions::default()
    };
    let d = diff_nested(&a, &b, &opts).unwrap();
    let outer = d.chunks.as_ref().unwrap();
    let mid = outer[0].nested.as_ref().unwrap();
    // the innermost level is compared flat: the changed leaf is an
    // opaque mismatch, no tree below it
    let mid_chunks = mid.chunks.as_ref().unwrap();
    assert_eq!(mid_chunks.len(), 2);
    assert!(mid_chunks[0].eq);
    assert!(!mid_chunks[1].eq);
    assert!(mid_chunks.iter().all(|c| c.nested.is_none()));
}
