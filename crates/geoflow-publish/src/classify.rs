//! Quantile classification of raster values into a color ramp.

/// Colors assigned to the class breaks, lowest first.
pub const PALETTE: [&str; 8] = [
    "#FFFFFF", "#8c510a", "#d8b365", "#f6e8c3", "#f5f5f5", "#c7eae5", "#5ab4ac", "#01665e",
];

/// Color of the closing maximum-value entry.
pub const MAX_COLOR: &str = "#003300";

/// Number of quantile buckets.
const BUCKETS: usize = 7;

/// One entry of an interval color map.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapEntry {
    pub color: String,
    pub quantity: f64,
    pub opacity: f64,
}

impl ColorMapEntry {
    /// Label shown in legends; the quantity as written.
    pub fn label(&self) -> String {
        format_quantity(self.quantity)
    }
}

/// Classify pixel values into an interval color map.
///
/// Distinct values are sorted and every `len / 7`-th one (at least every one)
/// becomes a class break, skipping the last value. Infinite breaks are pulled
/// in to the nearest finite neighbour. The first break is transparent and a
/// closing entry marks the largest break. Returns an empty map when there are
/// no finite values.
pub fn classify(values: &[f64]) -> Vec<ColorMapEntry> {
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    let len = distinct.len();
    if len == 0 {
        return Vec::new();
    }

    let step = (len / BUCKETS).max(1);
    let mut breaks: Vec<f64> = if len == 1 {
        vec![distinct[0]]
    } else {
        (0..len - 1)
            .step_by(step)
            .take(PALETTE.len())
            .map(|i| distinct[i])
            .collect()
    };

    for edge in &mut breaks {
        if *edge == f64::NEG_INFINITY {
            *edge = distinct.get(1).copied().unwrap_or(*edge).floor();
        } else if *edge == f64::INFINITY {
            *edge = distinct[len.saturating_sub(2)].ceil();
        }
    }

    let max = breaks.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut entries: Vec<ColorMapEntry> = breaks
        .into_iter()
        .enumerate()
        .map(|(i, quantity)| ColorMapEntry {
            color: PALETTE[i].to_string(),
            quantity,
            opacity: if i == 0 { 0.0 } else { 1.0 },
        })
        .collect();
    entries.push(ColorMapEntry {
        color: MAX_COLOR.to_string(),
        quantity: max,
        opacity: 1.0,
    });
    entries
}

/// Format a quantity for the style document; whole numbers keep one decimal.
pub fn format_quantity(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourteen_values_seven_buckets() {
        let values: Vec<f64> = (0..14).map(f64::from).collect();
        let entries = classify(&values);

        // step 2 over indices 0..13 gives 0,2,...,12 plus the max entry
        let quantities: Vec<f64> = entries.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 12.0]);
        assert_eq!(entries[0].opacity, 0.0);
        assert!(entries[1..].iter().all(|e| e.opacity == 1.0));
        assert_eq!(entries[0].color, "#FFFFFF");
        assert_eq!(entries.last().unwrap().color, MAX_COLOR);
    }

    #[test]
    fn test_duplicates_and_nan_removed() {
        let values = [3.0, 1.0, f64::NAN, 3.0, 2.0, 1.0];
        let entries = classify(&values);
        let quantities: Vec<f64> = entries.iter().map(|e| e.quantity).collect();
        assert_eq!(quantities, vec![1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_infinite_edges_replaced() {
        let values = [f64::NEG_INFINITY, 1.5, 2.0, 3.0, f64::INFINITY];
        let entries = classify(&values);
        assert_eq!(entries[0].quantity, 1.0);
        assert!(entries.iter().all(|e| e.quantity.is_finite()));
    }

    #[test]
    fn test_break_count_capped_by_palette() {
        // 13 values give a step of one, more breaks than colors
        let values: Vec<f64> = (0..13).map(f64::from).collect();
        let entries = classify(&values);
        assert_eq!(entries.len(), PALETTE.len() + 1);
        assert_eq!(entries[7].color, "#01665e");
    }

    #[test]
    fn test_single_and_empty() {
        assert!(classify(&[]).is_empty());
        assert!(classify(&[f64::NAN]).is_empty());

        let entries = classify(&[5.0, 5.0]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].quantity, 5.0);
        assert_eq!(entries[1].quantity, 5.0);
    }

    #[test]
    fn test_label_formatting() {
        assert_eq!(format_quantity(3.0), "3.0");
        assert_eq!(format_quantity(2.25), "2.25");
    }
}
