//! Width-aware string helpers for a fixed-column terminal.
//!
//! All measurements are in display columns, not bytes or chars: CJK and most
//! emoji take two columns, combining marks take none.

use unicode_width::UnicodeWidthChar;

/// Blank glyphs appended after the text before it wraps around in a marquee.
pub const MARQUEE_GAP: usize = 3;

/// Render frames per one-glyph marquee step.
pub const MARQUEE_FRAMES_PER_STEP: u8 = 3;

/// Sum of per-glyph column widths, the same measure [`truncate`] accumulates.
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Longest prefix of `s` that fits in `max_width` columns.
///
/// A double-width glyph that would straddle the limit is dropped whole.
pub fn truncate(s: &str, max_width: usize) -> String {
    take_fitting(s.chars(), max_width)
}

/// Bounded-width window into `s`, scrolled by `offset` glyphs.
///
/// Text that already fits is returned as-is for every offset. Longer text is
/// treated as a ring of its glyphs followed by [`MARQUEE_GAP`] spaces; the
/// window starts at `offset` modulo the ring length and wraps through the gap.
pub fn marquee_view(s: &str, max_width: usize, offset: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }

    let ring: Vec<char> = s
        .chars()
        .chain(std::iter::repeat_n(' ', MARQUEE_GAP))
        .collect();
    let start = offset % ring.len();
    let glyphs = ring[start..].iter().chain(ring[..start].iter()).copied();
    take_fitting(glyphs, max_width)
}

fn take_fitting(glyphs: impl Iterator<Item = char>, max_width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in glyphs {
        let width = char_width(ch);
        if used + width > max_width {
            break;
        }
        used += width;
        out.push(ch);
    }
    out
}

/// Animation state for one scrolling label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marquee {
    pub offset: usize,
}

impl Marquee {
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn step(&mut self) {
        self.offset = self.offset.wrapping_add(1);
    }

    pub fn view(&self, s: &str, max_width: usize) -> String {
        marquee_view(s, max_width, self.offset)
    }
}

/// Frame counter that fires once every [`MARQUEE_FRAMES_PER_STEP`] ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    frames: u8,
}

impl FrameClock {
    pub fn reset(&mut self) {
        self.frames = 0;
    }

    /// Counts one rendered frame; true when the marquees should advance.
    pub fn tick(&mut self) -> bool {
        self.frames += 1;
        if self.frames >= MARQUEE_FRAMES_PER_STEP {
            self.frames = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;
    use proptest::prop_assert_eq;

    #[test]
    fn truncate_keeps_ascii_prefix() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 10), "hi");
        assert_eq!(truncate("hello", 0), "");
    }

    #[test]
    fn truncate_never_splits_wide_glyph() {
        // each glyph is two columns
        assert_eq!(truncate("日本語", 3), "日");
        assert_eq!(truncate("日本語", 4), "日本");
        assert_eq!(truncate("a日b", 2), "a");
    }

    #[test]
    fn marquee_returns_short_text_unchanged() {
        assert_eq!(marquee_view("short", 10, 0), "short");
        assert_eq!(marquee_view("short", 10, 7), "short");
        assert_eq!(marquee_view("exact", 5, 3), "exact");
    }

    #[test]
    fn marquee_scrolls_through_padding_gap() {
        assert_eq!(marquee_view("abcdef", 4, 0), "abcd");
        assert_eq!(marquee_view("abcdef", 4, 1), "bcde");
        assert_eq!(marquee_view("abcdef", 4, 4), "ef  ");
        assert_eq!(marquee_view("abcdef", 4, 6), "   a");
        // ring length is 6 + 3
        assert_eq!(marquee_view("abcdef", 4, 9), "abcd");
    }

    #[test]
    fn marquee_window_with_wide_glyphs_stops_early() {
        assert_eq!(marquee_view("日本語テキスト", 5, 0), "日本");
        assert_eq!(marquee_view("日本語テキスト", 5, 1), "本語");
    }

    #[test]
    fn frame_clock_fires_every_third_tick() {
        let mut clock = FrameClock::default();
        let fired: Vec<bool> = (0..6).map(|_| clock.tick()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn marquee_reset_returns_to_start() {
        let mut marquee = Marquee::default();
        marquee.step();
        marquee.step();
        assert_eq!(marquee.view("abcdef", 3), "cde");
        marquee.reset();
        assert_eq!(marquee.view("abcdef", 3), "abc");
    }

    proptest::proptest! {
        #[test]
        fn fitting_text_is_never_animated(s in "\\PC{0,20}", extra in 0usize..10, offset in 0usize..500) {
            let width = display_width(&s) + extra;
            prop_assert_eq!(marquee_view(&s, width, offset), s);
        }

        #[test]
        fn marquee_view_stays_within_width(s in "[a-z日本語 ]{1,40}", max_width in 0usize..30, offset in 0usize..500) {
            let view = marquee_view(&s, max_width, offset);
            if display_width(&s) > max_width {
                prop_assert!(display_width(&view) <= max_width);
            }
        }

        #[test]
        fn truncate_is_a_prefix_within_width(s in "\\PC{0,40}", max_width in 0usize..30) {
            let cut = truncate(&s, max_width);
            prop_assert!(s.starts_with(&cut));
            prop_assert!(display_width(&cut) <= max_width);
        }
    }
}
