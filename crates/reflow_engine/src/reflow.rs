//! Driver resolution and wave propagation

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use sheet_model::{DataSet, Element, Row};

use crate::geometry::Rect;
use crate::height::{RowHeightCalculator, TableHeightFn};
use crate::{LayoutError, Result};

/// Height changes smaller than this are ignored
pub const HEIGHT_EPSILON: f64 = 0.5;

/// What happened to one driver table during a reflow pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAdjustment {
    pub element_id: String,
    pub previous_height: f64,
    pub new_height: f64,
    /// Signed change applied to everything in the driver's shadow
    pub delta: f64,
    /// Number of elements moved by this driver's wave
    pub shifted: usize,
}

/// Final geometry of one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflowResult {
    pub rects: HashMap<String, Rect>,
    /// Drivers whose height changed, in processing order
    pub adjustments: Vec<DriverAdjustment>,
}

impl ReflowResult {
    pub fn rect(&self, element_id: &str) -> Option<&Rect> {
        self.rects.get(element_id)
    }

    /// Whether any element moved or resized
    pub fn changed(&self) -> bool {
        !self.adjustments.is_empty()
    }

    /// Copies of `elements` carrying their reflowed position and size
    pub fn apply_to(&self, elements: &[Element]) -> Vec<Element> {
        elements
            .iter()
            .map(|element| {
                let mut element = element.clone();
                if let Some(rect) = self.rects.get(&element.id) {
                    element.position.x = rect.x;
                    element.position.y = rect.y;
                    element.dimension.width = rect.width;
                    element.dimension.height = rect.height;
                }
                element
            })
            .collect()
    }
}

/// Simulated rectangles for one page build, indexed like the element slice
struct WorkingRects {
    rects: Vec<Rect>,
}

impl WorkingRects {
    fn seed(elements: &[Element]) -> Self {
        Self { rects: elements.iter().map(Rect::of).collect() }
    }

    fn get(&self, index: usize) -> Rect {
        self.rects[index]
    }

    fn set_height(&mut self, index: usize, height: f64) {
        self.rects[index].height = height;
    }

    fn shift(&mut self, index: usize, delta: f64) {
        self.rects[index].y += delta;
    }

    /// Push every unlocked element in the pusher's shadow by `delta`,
    /// transitively. Returns how many elements moved.
    fn propagate(&mut self, elements: &[Element], driver: usize, delta: f64) -> usize {
        let mut processed = vec![false; self.rects.len()];
        processed[driver] = true;

        let mut queue = VecDeque::new();
        queue.push_back((driver, self.get(driver)));
        let mut shifted = 0;

        while let Some((pusher_index, pusher)) = queue.pop_front() {
            for index in 0..self.rects.len() {
                if index == pusher_index || processed[index] || elements[index].locked {
                    continue;
                }

                let rect = self.get(index);
                // Top edge against the pusher's top, not its previous bottom
                if rect.overlaps_horizontally(&pusher) && rect.y > pusher.y {
                    self.shift(index, delta);
                    processed[index] = true;
                    shifted += 1;
                    queue.push_back((index, self.get(index)));
                }
            }
        }

        shifted
    }

    fn into_map(self, elements: &[Element]) -> HashMap<String, Rect> {
        elements
            .iter()
            .zip(self.rects)
            .map(|(element, rect)| (element.id.clone(), rect))
            .collect()
    }
}

/// Computes final element geometry for a page
///
/// The engine never mutates its inputs. Each call owns its own working
/// rectangles, so one engine can serve concurrent builds.
#[derive(Debug, Clone, Default)]
pub struct ReflowEngine<H = RowHeightCalculator> {
    height_fn: H,
}

impl ReflowEngine<RowHeightCalculator> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: TableHeightFn> ReflowEngine<H> {
    /// Use a custom height function for driver tables
    pub fn with_height_fn(height_fn: H) -> Self {
        Self { height_fn }
    }

    /// Reflow the elements of one page
    ///
    /// `data` is the full dataset, `record` the row the page is bound to.
    /// A grouped driver table uses the record's value of its group field.
    pub fn reflow(
        &self,
        elements: &[Element],
        data: &DataSet,
        record: Option<&Row>,
        page_index: usize,
    ) -> Result<ReflowResult> {
        let mut working = WorkingRects::seed(elements);
        let mut adjustments = Vec::new();

        for index in driver_order(elements) {
            let element = &elements[index];
            let Some(settings) = element.table_settings() else {
                continue;
            };

            let current = working.get(index);
            if !current.y.is_finite() || !current.height.is_finite() {
                return Err(LayoutError::MalformedTable {
                    element_id: element.id.clone(),
                    page_index,
                    message: "non-finite design rectangle".to_string(),
                });
            }

            let group_value = settings
                .group_by_field
                .as_deref()
                .and_then(|field| record.and_then(|row| row.get(field)));

            let required = self
                .height_fn
                .required_height(settings, data, group_value)
                .map_err(|message| LayoutError::HeightCalculation {
                    element_id: element.id.clone(),
                    page_index,
                    message,
                })?;

            if !required.is_finite() || required < 0.0 {
                return Err(LayoutError::HeightCalculation {
                    element_id: element.id.clone(),
                    page_index,
                    message: format!("height function returned {}", required),
                });
            }

            let delta = required - current.height;
            if delta.abs() < HEIGHT_EPSILON {
                continue;
            }

            working.set_height(index, required);
            let shifted = working.propagate(elements, index, delta);

            tracing::debug!(
                element_id = %element.id,
                page_index,
                previous_height = current.height,
                new_height = required,
                delta,
                shifted,
                "Driver table resized"
            );

            adjustments.push(DriverAdjustment {
                element_id: element.id.clone(),
                previous_height: current.height,
                new_height: required,
                delta,
                shifted,
            });
        }

        Ok(ReflowResult { rects: working.into_map(elements), adjustments })
    }
}

/// Indices of driver tables, top to bottom by design y, declaration order on ties
fn driver_order(elements: &[Element]) -> Vec<usize> {
    let mut drivers: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, element)| element.is_driver_table())
        .map(|(index, _)| index)
        .collect();

    drivers.sort_by(|a, b| elements[*a].position.y.total_cmp(&elements[*b].position.y));
    drivers
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sheet_model::{TableColumn, TableSettings};

    fn rows(n: usize) -> DataSet {
        DataSet::with_rows(
            vec!["Group".into(), "Name".into()],
            (0..n)
                .map(|i| {
                    let group = if i % 2 == 0 { "A" } else { "B" };
                    Row::from_pairs([("Group", group.to_string()), ("Name", format!("Item {}", i))])
                })
                .collect(),
        )
    }

    fn driver(id: &str, x: f64, y: f64, width: f64, height: f64) -> Element {
        let settings = TableSettings::data(vec![TableColumn::new("Name", "Name")]).auto_height();
        Element::table(id, settings, x, y, width, height)
    }

    fn boxed(id: &str, x: f64, y: f64) -> Element {
        Element::text(id, id, x, y, 100.0, 30.0)
    }

    fn scenario() -> Vec<Element> {
        vec![
            driver("table", 50.0, 50.0, 300.0, 100.0),
            boxed("b", 100.0, 200.0),
            boxed("c", 500.0, 200.0),
        ]
    }

    #[test]
    fn test_design_height_matches_no_shift() {
        let result = ReflowEngine::new().reflow(&scenario(), &rows(4), None, 0).unwrap();

        assert!(!result.changed());
        assert_eq!(result.rect("table").unwrap().height, 100.0);
        assert_eq!(result.rect("b").unwrap().y, 200.0);
    }

    #[test]
    fn test_growing_driver_pushes_overlapping_siblings() {
        let result = ReflowEngine::new().reflow(&scenario(), &rows(7), None, 0).unwrap();

        assert_eq!(result.rect("table").unwrap().height, 160.0);
        assert_eq!(result.rect("table").unwrap().y, 50.0);
        assert_eq!(result.rect("b").unwrap().y, 260.0);
        assert_eq!(result.rect("c").unwrap().y, 200.0);

        assert_eq!(result.adjustments.len(), 1);
        assert_eq!(result.adjustments[0].delta, 60.0);
        assert_eq!(result.adjustments[0].shifted, 1);
    }

    #[test]
    fn test_shrinking_driver_pulls_siblings_up() {
        let result = ReflowEngine::new().reflow(&scenario(), &rows(2), None, 0).unwrap();

        assert_eq!(result.rect("table").unwrap().height, 60.0);
        assert_eq!(result.rect("b").unwrap().y, 160.0);
    }

    #[test]
    fn test_locked_and_above_elements_stay() {
        let elements = vec![
            boxed("above", 60.0, 10.0),
            driver("table", 50.0, 50.0, 300.0, 100.0),
            boxed("locked", 100.0, 200.0).locked(),
            boxed("free", 200.0, 300.0),
        ];

        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();
        assert_eq!(result.rect("above").unwrap().y, 10.0);
        assert_eq!(result.rect("locked").unwrap().y, 200.0);
        assert_eq!(result.rect("free").unwrap().y, 360.0);
    }

    #[test]
    fn test_shift_propagates_transitively() {
        // "far" does not overlap the driver but sits under "b"
        let elements = vec![
            driver("table", 0.0, 0.0, 100.0, 100.0),
            Element::text("b", "b", 50.0, 150.0, 200.0, 30.0),
            Element::text("far", "far", 200.0, 250.0, 100.0, 30.0),
        ];

        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();
        assert_eq!(result.rect("b").unwrap().y, 210.0);
        assert_eq!(result.rect("far").unwrap().y, 310.0);
        assert_eq!(result.adjustments[0].shifted, 2);
    }

    #[test]
    fn test_element_starting_inside_driver_is_pushed() {
        // Below the driver's top edge but above its old bottom
        let elements = vec![driver("table", 0.0, 50.0, 300.0, 100.0), boxed("inner", 10.0, 120.0)];

        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();
        assert_eq!(result.rect("inner").unwrap().y, 180.0);
    }

    #[test]
    fn test_element_moved_once_per_wave() {
        // "b" sits under both "a" and the driver
        let elements = vec![
            driver("table", 0.0, 0.0, 300.0, 100.0),
            boxed("a", 0.0, 150.0),
            boxed("b", 50.0, 250.0),
        ];

        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();
        assert_eq!(result.rect("a").unwrap().y, 210.0);
        assert_eq!(result.rect("b").unwrap().y, 310.0);
    }

    #[test]
    fn test_upper_driver_moves_lower_driver_first() {
        let upper = driver("upper", 0.0, 0.0, 300.0, 100.0);
        let lower = driver("lower", 0.0, 200.0, 300.0, 100.0);
        let below = boxed("below", 0.0, 400.0);

        // Declared out of order: sorting by y must still handle "upper" first
        let elements = vec![lower, below, upper];
        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();

        assert_eq!(result.rect("upper").unwrap().height, 160.0);
        assert_eq!(result.rect("lower").unwrap().y, 260.0);
        assert_eq!(result.rect("lower").unwrap().height, 160.0);
        assert_eq!(result.rect("below").unwrap().y, 520.0);
        assert_eq!(
            result.adjustments.iter().map(|a| a.element_id.as_str()).collect::<Vec<_>>(),
            vec!["upper", "lower"]
        );
    }

    #[test]
    fn test_grouped_driver_uses_record_value() {
        let settings = TableSettings::data(vec![TableColumn::new("Name", "Name")])
            .auto_height()
            .grouped_by("Group");
        let elements = vec![Element::table("t", settings, 0.0, 0.0, 100.0, 100.0)];
        let data = rows(6);
        let record = Row::from_pairs([("Group", "A")]);

        let result = ReflowEngine::new().reflow(&elements, &data, Some(&record), 0).unwrap();
        assert_eq!(result.rect("t").unwrap().height, 20.0 + 3.0 * 20.0);

        // Without a record the whole dataset is bound
        let result = ReflowEngine::new().reflow(&elements, &data, None, 0).unwrap();
        assert_eq!(result.rect("t").unwrap().height, 20.0 + 6.0 * 20.0);
    }

    #[test]
    fn test_non_driver_table_unchanged() {
        let settings = TableSettings::data(vec![TableColumn::new("Name", "Name")]);
        let elements = vec![Element::table("t", settings, 5.0, 6.0, 70.0, 80.0), boxed("b", 5.0, 100.0)];

        let result = ReflowEngine::new().reflow(&elements, &rows(20), None, 0).unwrap();
        assert_eq!(*result.rect("t").unwrap(), Rect::new(5.0, 6.0, 70.0, 80.0));
        assert_eq!(result.rect("b").unwrap().y, 100.0);
    }

    #[test]
    fn test_height_fn_error_carries_page_context() {
        let failing = |_: &TableSettings, _: &DataSet, _: Option<&str>| {
            Err::<f64, String>("boom".to_string())
        };
        let engine = ReflowEngine::with_height_fn(failing);

        let err = engine.reflow(&scenario(), &rows(3), None, 4).unwrap_err();
        assert_eq!(err.page_index(), 4);
        assert_eq!(err.element_id(), "table");
        assert!(matches!(err, LayoutError::HeightCalculation { .. }));
    }

    #[test]
    fn test_negative_height_rejected() {
        let engine = ReflowEngine::with_height_fn(|_: &TableSettings, _: &DataSet, _: Option<&str>| {
            Ok::<f64, String>(-1.0)
        });
        assert!(engine.reflow(&scenario(), &rows(3), None, 0).is_err());
    }

    #[test]
    fn test_apply_to_updates_geometry() {
        let elements = scenario();
        let result = ReflowEngine::new().reflow(&elements, &rows(7), None, 0).unwrap();
        let applied = result.apply_to(&elements);

        assert_eq!(applied[0].dimension.height, 160.0);
        assert_eq!(applied[1].position.y, 260.0);
        // inputs untouched
        assert_eq!(elements[1].position.y, 200.0);
    }

    fn arb_element(index: usize) -> impl Strategy<Value = Element> {
        (0.0..500.0f64, 0.0..1000.0f64, 1.0..300.0f64, 1.0..200.0f64, any::<bool>(), any::<bool>())
            .prop_map(move |(x, y, w, h, is_driver, locked)| {
                let id = format!("e{}", index);
                let element = if is_driver { driver(&id, x, y, w, h) } else { Element::text(&id, "x", x, y, w, h) };
                if locked { element.locked() } else { element }
            })
    }

    fn arb_page() -> impl Strategy<Value = Vec<Element>> {
        (1usize..12).prop_flat_map(|n| (0..n).map(arb_element).collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn prop_reflow_is_idempotent(elements in arb_page(), n in 0usize..30) {
            let data = rows(n);
            let engine = ReflowEngine::new();
            let first = engine.reflow(&elements, &data, None, 0).unwrap();
            let second = engine.reflow(&elements, &data, None, 0).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_locked_elements_never_move(elements in arb_page(), n in 0usize..30) {
            let result = ReflowEngine::new().reflow(&elements, &rows(n), None, 0).unwrap();
            for element in elements.iter().filter(|e| e.locked) {
                let rect = result.rect(&element.id).unwrap();
                prop_assert_eq!(rect.y, element.position.y);
                prop_assert_eq!(rect.x, element.position.x);
            }
        }

        #[test]
        fn prop_without_drivers_rects_are_design_rects(n in 0usize..30, ys in proptest::collection::vec(0.0..1000.0f64, 1..10)) {
            let elements: Vec<Element> = ys
                .iter()
                .enumerate()
                .map(|(i, y)| Element::text(format!("e{}", i), "x", 0.0, *y, 50.0, 20.0))
                .collect();
            let result = ReflowEngine::new().reflow(&elements, &rows(n), None, 0).unwrap();
            for element in &elements {
                prop_assert_eq!(*result.rect(&element.id).unwrap(), Rect::of(element));
            }
        }
    }
}
