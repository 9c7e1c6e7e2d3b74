use serde::{Deserialize, Serialize};

/// Alpha applied to every region fill and texture pixel.
pub const TRANSPARENCY: u8 = 200;

/// Golden-ratio conjugate, used to spread hashed channel values.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// An RGB colour with a fixed alpha. Channels are `u8`, so every
/// operation below stays inside 0..=255 by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: TRANSPARENCY,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// 50% linear blend toward white.
    pub const fn lighten(self) -> Self {
        Self {
            r: lighten_channel(self.r),
            g: lighten_channel(self.g),
            b: lighten_channel(self.b),
            a: self.a,
        }
    }

    /// 50% linear blend toward black.
    pub const fn darken(self) -> Self {
        Self {
            r: darken_channel(self.r),
            g: darken_channel(self.g),
            b: darken_channel(self.b),
            a: self.a,
        }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn channel_average(self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const fn lighten_channel(c: u8) -> u8 {
    ((c as u16 + 255) / 2) as u8
}

pub const fn darken_channel(c: u8) -> u8 {
    c / 2
}

/// Mix `secondary` into `primary` 1:6. Only the channel average of the
/// secondary is used, so the result stays a shade of the primary.
pub fn mix(primary: Colour, secondary: Colour) -> Colour {
    let reference = secondary.channel_average() as u16;
    let blend = |p: u8| ((p as u16 * 6 + reference) / 7) as u8;
    Colour::rgb(blend(primary.r), blend(primary.g), blend(primary.b))
}

/// Deterministic colour for a name: CRC32 of the name, each of the first
/// three bytes pushed along the golden-ratio sequence so that similar
/// hashes still land on well-separated channel values.
pub fn name_colour(name: &str) -> Colour {
    let bytes = crc32fast::hash(name.as_bytes()).to_be_bytes();
    let spread = |byte: u8| {
        let value = (byte as f64 / 256.0 + INV_PHI).fract();
        (value * 256.0).floor().min(255.0) as u8
    };
    Colour::rgb(spread(bytes[0]), spread(bytes[1]), spread(bytes[2]))
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_colour(hex: &str) -> Option<Colour> {
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Colour::rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::{Colour, TRANSPARENCY, mix, name_colour, parse_hex_colour};

    #[test]
    fn lighten_and_darken_blend_halfway() {
        let c = Colour::rgb(200, 50, 0);
        assert_eq!(c.lighten(), Colour::rgb(227, 152, 127));
        assert_eq!(Colour::WHITE.lighten(), Colour::WHITE);
        assert_eq!(Colour::BLACK.lighten(), Colour::rgb(127, 127, 127));
        assert_eq!(c.darken(), Colour::rgb(100, 25, 0));
        assert_eq!(Colour::WHITE.darken(), Colour::rgb(127, 127, 127));
    }

    #[test]
    fn lighten_keeps_alpha() {
        let c = Colour::rgba(10, 20, 30, 77);
        assert_eq!(c.lighten().a, 77);
        assert_eq!(c.darken().a, 77);
    }

    #[test]
    fn mix_weights_primary_six_to_one() {
        let family = Colour::rgb(70, 140, 210);
        let own = Colour::rgb(0, 0, 0);
        assert_eq!(mix(family, own), Colour::rgb(60, 120, 180));

        let own_white = Colour::rgb(255, 255, 255);
        assert_eq!(mix(family, own_white), Colour::rgb(96, 156, 216));
    }

    #[test]
    fn mix_of_extremes_stays_in_range() {
        let mixed = mix(Colour::WHITE, Colour::WHITE);
        assert_eq!(mixed, Colour::rgb(255, 255, 255));
        assert_eq!(mixed.a, TRANSPARENCY);
    }

    #[test]
    fn name_colour_is_deterministic() {
        assert_eq!(name_colour("Haida"), name_colour("Haida"));
        assert_ne!(name_colour("Haida"), name_colour("Tlingit"));
        assert_eq!(name_colour("Haida").a, TRANSPARENCY);
    }

    #[test]
    fn parse_hex_colour_accepts_with_and_without_hash() {
        assert_eq!(parse_hex_colour("#ff8000"), Some(Colour::rgb(255, 128, 0)));
        assert_eq!(parse_hex_colour("0a0B0c"), Some(Colour::rgb(10, 11, 12)));
        assert_eq!(parse_hex_colour("#fff"), None);
        assert_eq!(parse_hex_colour("#gg0000"), None);
        assert_eq!(parse_hex_colour("#é0000"), None);
    }

    #[test]
    fn to_hex_round_trips_through_parser() {
        let c = Colour::rgb(1, 200, 99);
        assert_eq!(parse_hex_colour(&c.to_hex()), Some(c));
    }
}
