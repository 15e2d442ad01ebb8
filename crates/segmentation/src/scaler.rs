//! Per-feature standardization (zero mean, unit variance).

use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Column statistics fitted on the full population of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit means and population standard deviations. Constant columns get a
    /// scale of 1 so they standardize to zero instead of NaN.
    pub fn fit(data: ArrayView2<'_, f64>) -> Self {
        let n_features = data.ncols();
        if data.nrows() == 0 {
            return Self {
                mean: Array1::zeros(n_features),
                scale: Array1::ones(n_features),
            };
        }

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        Self { mean, scale }
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        (&data - &self.mean) / &self.scale
    }

    pub fn fit_transform(data: ArrayView2<'_, f64>) -> (Self, Array2<f64>) {
        let scaler = Self::fit(data);
        let scaled = scaler.transform(data);
        (scaler, scaled)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let data = array![[1.0, 10.0, 100.0], [2.0, 20.0, 300.0], [3.0, 30.0, 500.0]];
        let (_, scaled) = StandardScaler::fit_transform(data.view());
        for col in scaled.axis_iter(Axis(1)) {
            assert!(col.mean().unwrap().abs() < 1e-12);
            assert!((col.std(0.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn uses_population_standard_deviation() {
        let data = array![[0.0], [2.0]];
        let scaler = StandardScaler::fit(data.view());
        assert_eq!(scaler.mean()[0], 1.0);
        assert_eq!(scaler.scale()[0], 1.0);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let data = array![[5.0, 1.0], [5.0, 2.0]];
        let (_, scaled) = StandardScaler::fit_transform(data.view());
        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[1, 0]], 0.0);
    }

    #[test]
    fn empty_input_is_accepted() {
        let data = Array2::<f64>::zeros((0, 3));
        let (_, scaled) = StandardScaler::fit_transform(data.view());
        assert_eq!(scaled.nrows(), 0);
    }
}
