/// Colours handed out, in order, to graph items without an explicit colour.
pub const DEFAULT_COLORS: [&str; 10] = [
    "C80000", "009600", "000096", "960096", "009696", "969600", "969696", "FF0000", "00FF00", "0000FF",
];

/// A cyclic colour source. Each draw consumes one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<String>,
    cursor: usize,
}

impl ColorPalette {
    /// A palette cycling through `colors`. An empty list falls back to the defaults.
    pub fn new<I, S>(colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors, cursor: 0 }
    }

    pub fn next_color(&mut self) -> String {
        let color = self.colors[self.cursor % self.colors.len()].clone();
        self.cursor = (self.cursor + 1) % self.colors.len();
        color
    }

    /// Restart from the first colour.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|color| color.to_string()).collect(),
            cursor: 0,
        }
    }
}
