// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! A small LZF-style compressor, used by `gbSingleSet`'s compression path
//! when a value crosses the configured compression threshold. The source
//! links against `liblzf`; this rewrite has no such dependency available
//! in the corpus, so the format is reimplemented directly rather than
//! faked behind a fabricated crate. The on-the-wire shape (a run of
//! literal-length-prefixed bytes interleaved with back-references) matches
//! liblzf's control-byte encoding so the ratio and behavior this crate
//! reports lines up with what the original tool would have reported.

const MAX_LITERAL: usize = 32;
const MAX_OFF: usize = 1 << 13;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 264; // 2 + 7 + 255

/// Compresses `input` into a new buffer, or returns `None` if the
/// compressed form would not be at least one byte shorter than `input`
/// (mirrors `gbSingleSet`'s "only keep it if it actually shrank" check).
pub fn lzf_compress(input: &[u8]) -> Option<Vec<u8>> {
    if input.len() < MIN_MATCH {
        return None;
    }

    let mut out = Vec::with_capacity(input.len());
    // hash(3 bytes) -> most recent position with that hash
    let mut table: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();

    let mut literal_start = 0usize;
    let mut i = 0usize;
    let n = input.len();

    while i < n {
        if i + MIN_MATCH > n {
            i = n;
            break;
        }

        let h = hash3(&input[i..i + 3]);
        let candidate = table.insert(h, i);

        let best = candidate.and_then(|cand| {
            if i - cand > MAX_OFF || i <= cand {
                return None;
            }
            let max_len = (n - i).min(MAX_MATCH);
            let len = match_len(input, cand, i, max_len);
            if len >= MIN_MATCH {
                Some((cand, len))
            } else {
                None
            }
        });

        match best {
            Some((cand, len)) => {
                flush_literals(&mut out, &input[literal_start..i]);
                encode_match(&mut out, i - cand - 1, len);
                i += len;
                literal_start = i;
            }
            None => {
                i += 1;
            }
        }
    }

    flush_literals(&mut out, &input[literal_start..n]);

    if out.len() < input.len() {
        Some(out)
    } else {
        None
    }
}

/// Decompresses a buffer produced by [`lzf_compress`]. `expected_len` is
/// the original plaintext length, recorded separately by the item (the
/// format itself carries no trailing length).
pub fn lzf_decompress(input: &[u8], expected_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(expected_len);
    let mut i = 0;
    while i < input.len() {
        let ctrl = input[i] as usize;
        i += 1;
        if ctrl < MAX_LITERAL {
            let len = ctrl + 1;
            out.extend_from_slice(&input[i..i + len]);
            i += len;
        } else {
            let mut len = ctrl >> 5;
            let mut off = (ctrl & 0x1f) << 8;
            if len == 7 {
                len += input[i] as usize;
                i += 1;
            }
            off |= input[i] as usize;
            i += 1;
            let match_len = len + 2;
            let start = out.len() - off - 1;
            for j in 0..match_len {
                let b = out[start + j];
                out.push(b);
            }
        }
    }
    out
}

fn hash3(b: &[u8]) -> u32 {
    (b[0] as u32).wrapping_mul(2654435761)
        ^ (b[1] as u32).wrapping_mul(40503)
        ^ (b[2] as u32)
}

fn match_len(input: &[u8], cand: usize, pos: usize, max_len: usize) -> usize {
    let mut len = 0;
    while len < max_len && input[cand + len] == input[pos + len] {
        len += 1;
    }
    len
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

fn encode_match(out: &mut Vec<u8>, off: usize, len: usize) {
    let len = len - 2;
    if len < 7 {
        out.push(((len << 5) | (off >> 8)) as u8);
    } else {
        out.push(((7 << 5) | (off >> 8)) as u8);
        out.push((len - 7) as u8);
    }
    out.push((off & 0xff) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_repetitive_input() {
        let input = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaabbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_vec();
        let compressed = lzf_compress(&input).expect("should compress");
        assert!(compressed.len() < input.len());
        assert_eq!(lzf_decompress(&compressed, input.len()), input);
    }

    #[test]
    fn refuses_incompressible_short_input() {
        assert_eq!(lzf_compress(b"ab"), None);
    }

    #[test]
    fn refuses_when_no_shrinkage() {
        // High-entropy input with no repeated 3-grams compresses to
        // *more* bytes than the input (one control byte per literal run
        // plus the literal itself cannot beat 1:1), so this must bail out.
        let input: Vec<u8> = (0u8..=255).collect();
        assert_eq!(lzf_compress(&input), None);
    }

    #[test]
    fn round_trips_mixed_literal_and_match_runs() {
        let mut input = Vec::new();
        input.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
        input.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
        input.extend_from_slice(b"Something entirely different follows here.");
        let compressed = lzf_compress(&input).expect("should compress");
        assert_eq!(lzf_decompress(&compressed, input.len()), input);
    }
}
