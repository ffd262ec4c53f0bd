//! Parse and render options.

use crate::limits::ResourceLimits;

/// Parsing/rendering options.
///
/// Each flag is independently toggleable. The numeric constants mirror the
/// bit layout of the classic cmark option word, so an integer option set
/// converts losslessly with [`Options::from_bits`] and [`Options::bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Emit `data-sourcepos` attributes on block elements.
    pub sourcepos: bool,
    /// Render soft line breaks as hard breaks.
    pub hardbreaks: bool,
    /// Render soft line breaks as spaces.
    pub nobreaks: bool,
    /// Repair invalid UTF-8 in byte input instead of rejecting it.
    pub validate_utf8: bool,
    /// Typographic quotes, dashes and ellipses.
    pub smart: bool,
    /// Enable footnote syntax (attaches the `footnotes` extension).
    pub footnotes: bool,
    /// Pass raw HTML and dangerous URLs through untouched.
    pub unsafe_: bool,
    /// Size and depth bounds for a single parse.
    pub limits: ResourceLimits,
}

impl Options {
    pub const SOURCEPOS: u32 = 1 << 1;
    pub const HARDBREAKS: u32 = 1 << 2;
    pub const NOBREAKS: u32 = 1 << 4;
    pub const VALIDATE_UTF8: u32 = 1 << 9;
    pub const SMART: u32 = 1 << 10;
    pub const FOOTNOTES: u32 = 1 << 13;
    pub const UNSAFE: u32 = 1 << 17;

    /// Build options from a bit set. Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            sourcepos: bits & Self::SOURCEPOS != 0,
            hardbreaks: bits & Self::HARDBREAKS != 0,
            nobreaks: bits & Self::NOBREAKS != 0,
            validate_utf8: bits & Self::VALIDATE_UTF8 != 0,
            smart: bits & Self::SMART != 0,
            footnotes: bits & Self::FOOTNOTES != 0,
            unsafe_: bits & Self::UNSAFE != 0,
            limits: ResourceLimits::default(),
        }
    }

    /// The flag bits of these options.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        for (on, bit) in [
            (self.sourcepos, Self::SOURCEPOS),
            (self.hardbreaks, Self::HARDBREAKS),
            (self.nobreaks, Self::NOBREAKS),
            (self.validate_utf8, Self::VALIDATE_UTF8),
            (self.smart, Self::SMART),
            (self.footnotes, Self::FOOTNOTES),
            (self.unsafe_, Self::UNSAFE),
        ] {
            if on {
                bits |= bit;
            }
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_safe_and_plain() {
        let opts = Options::default();
        assert!(!opts.unsafe_);
        assert!(!opts.smart);
        assert_eq!(opts.bits(), 0);
    }

    #[test]
    fn bits_convert_both_ways() {
        let bits = Options::SMART | Options::UNSAFE | Options::SOURCEPOS;
        let opts = Options::from_bits(bits);
        assert!(opts.smart && opts.unsafe_ && opts.sourcepos);
        assert!(!opts.hardbreaks);
        assert_eq!(opts.bits(), bits);
    }

    #[test]
    fn unknown_bits_ignored() {
        assert_eq!(Options::from_bits(1 << 30), Options::default());
    }
}
