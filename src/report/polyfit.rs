//! Least squares polynomial fit.

/// Fits a polynomial of `degree` to the points, highest power first.
///
/// Returns `None` when there are fewer distinct points than coefficients or
/// the inputs differ in length. The system is solved by Householder QR on a
/// centred and scaled Vandermonde matrix, then mapped back to `x`.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = x.len();
    let m = degree + 1;
    if n != y.len() || n < m {
        return None;
    }

    let center = x.iter().sum::<f64>() / n as f64;
    let scale = x.iter().map(|v| (v - center).abs()).fold(0.0, f64::max);
    let scale = if scale > 0.0 { scale } else { 1.0 };

    // column major, columns are ascending powers of t
    let t: Vec<f64> = x.iter().map(|v| (v - center) / scale).collect();
    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|j| t.iter().map(|ti| ti.powi(j as i32)).collect())
        .collect();
    let mut rhs = y.to_vec();

    for k in 0..m {
        let norm = a[k][k..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if a[k][k] > 0.0 { -norm } else { norm };
        let mut v = a[k][k..].to_vec();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|e| e * e).sum();

        for col in a.iter_mut().skip(k) {
            reflect(&v, v_norm2, &mut col[k..]);
        }
        reflect(&v, v_norm2, &mut rhs[k..]);
    }

    let max_diag = (0..m).map(|k| a[k][k].abs()).fold(0.0, f64::max);
    if (0..m).any(|k| a[k][k].abs() <= max_diag * 1e-12) {
        return None;
    }

    let mut b = vec![0.0; m];
    for i in (0..m).rev() {
        let tail: f64 = ((i + 1)..m).map(|j| a[j][i] * b[j]).sum();
        b[i] = (rhs[i] - tail) / a[i][i];
    }

    // p(x) = sum_j b_j ((x - c) / s)^j, expanded binomially
    let mut coeffs = vec![0.0; m];
    for (j, bj) in b.iter().enumerate() {
        let bj = bj / scale.powi(j as i32);
        let mut binom = 1.0;
        for k in 0..=j {
            coeffs[k] += bj * binom * (-center).powi((j - k) as i32);
            binom = binom * (j - k) as f64 / (k + 1) as f64;
        }
    }
    coeffs.reverse();
    Some(coeffs)
}

/// Evaluates coefficients given highest power first.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, c| acc * x + c)
}

fn reflect(v: &[f64], v_norm2: f64, target: &mut [f64]) {
    if v_norm2 == 0.0 {
        return;
    }
    let dot: f64 = v.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let f = 2.0 * dot / v_norm2;
    for (t, vi) in target.iter_mut().zip(v) {
        *t -= f * vi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_an_exact_cubic() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v.powi(3) - v + 5.0).collect();

        let coeffs = polyfit(&x, &y, 3).unwrap();

        let expected = [2.0, 0.0, -1.0, 5.0];
        for (c, e) in coeffs.iter().zip(expected) {
            assert!((c - e).abs() < 1e-6, "{coeffs:?}");
        }
    }

    #[test]
    fn high_degree_fit_tracks_the_data() {
        let x: Vec<f64> = (0..168).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 1200.0 + 3.0 * v - 0.01 * v * v).collect();

        let coeffs = polyfit(&x, &y, 12).unwrap();

        assert_eq!(coeffs.len(), 13);
        for (xi, yi) in x.iter().zip(&y) {
            assert!((polyval(&coeffs, *xi) - yi).abs() < 1e-3);
        }
    }

    #[test]
    fn too_few_points() {
        assert_eq!(polyfit(&[1.0, 2.0], &[1.0, 2.0], 2), None);
        assert_eq!(polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0], 1), None);
    }

    #[test]
    fn repeated_x_is_rank_deficient() {
        assert_eq!(polyfit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 2), None);
    }

    #[test]
    fn horner() {
        assert_eq!(polyval(&[1.0, 0.0, -2.0], 3.0), 7.0);
        assert_eq!(polyval(&[], 3.0), 0.0);
    }
}
