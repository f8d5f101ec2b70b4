#![allow(dead_code)]

use jacolor::{Grid2d, Scalar, SparseMatrix};

/// `c0 = 2 x0 + x1 - 2 + cos(x3) sin(x4)`, `c1 = x2^2 + x3^2 - 2`,
/// `c2 = 3 x4 x5 - 3 + sin(x4 x5)`.
pub fn three_by_six<T: Scalar>(x: &[T]) -> Vec<T> {
    let two = T::lit(2.0);
    let three = T::lit(3.0);
    vec![
        two * x[0] + x[1] - two + x[3].cos() * x[4].sin(),
        x[2].powi(2) + x[3].powi(2) - two,
        three * x[4] * x[5] - three + (x[4] * x[5]).sin(),
    ]
}

/// Hand-derived Jacobian of [`three_by_six`].
pub fn three_by_six_jacobian(x: &[f64]) -> Vec<Vec<f64>> {
    let p = x[4] * x[5];
    vec![
        vec![2.0, 1.0, 0.0, -x[3].sin() * x[4].sin(), x[3].cos() * x[4].cos(), 0.0],
        vec![0.0, 0.0, 2.0 * x[2], 2.0 * x[3], 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 3.0 * x[5] + p.cos() * x[5], 3.0 * x[4] + p.cos() * x[4]],
    ]
}

/// `x_i = ln(1 + i)`.
pub fn log_point(n: usize) -> Vec<f64> {
    (0..n).map(|i| (1.0 + i as f64).ln()).collect()
}

/// Right-hand side of `u_t = u_xx + u_yy` on the unit square with `u = f(u)`
/// rows on the boundary, five-point stencil in the interior.
pub fn heat_rhs<T: Scalar>(u: &[T], mx: usize, my: usize) -> Vec<T> {
    let grid = Grid2d::from_vec((0, 0), mx, my, u.to_vec()).unwrap();
    let hx = 1.0 / (mx as f64 - 1.0);
    let hy = 1.0 / (my as f64 - 1.0);
    let sx = T::lit(1.0 / (hx * hx));
    let sy = T::lit(1.0 / (hy * hy));
    let two = T::lit(2.0);
    let (mx, my) = (mx as isize, my as isize);

    grid.indices()
        .map(|(i, j)| {
            let c = grid[(i, j)];
            if i == 0 || j == 0 || i == mx - 1 || j == my - 1 {
                c
            } else {
                let uxx = (grid[(i - 1, j)] + grid[(i + 1, j)] - two * c) * sx;
                let uyy = (grid[(i, j - 1)] + grid[(i, j + 1)] - two * c) * sy;
                uxx + uyy
            }
        })
        .collect()
}

/// Hand-assembled Jacobian of [`heat_rhs`] as `(row, col, value)` triplets.
pub fn heat_jacobian(mx: usize, my: usize) -> Vec<(usize, usize, f64)> {
    let hx = 1.0 / (mx as f64 - 1.0);
    let hy = 1.0 / (my as f64 - 1.0);
    let sx = 1.0 / (hx * hx);
    let sy = 1.0 / (hy * hy);
    let mut out = Vec::new();
    for j in 0..my {
        for i in 0..mx {
            let row = j * mx + i;
            if i == 0 || j == 0 || i == mx - 1 || j == my - 1 {
                out.push((row, row, 1.0));
            } else {
                out.push((row, row - 1, sx));
                out.push((row, row + 1, sx));
                out.push((row, row - mx, sy));
                out.push((row, row + mx, sy));
                out.push((row, row, -2.0 * sx - 2.0 * sy));
            }
        }
    }
    out
}

/// Smooth bump on the unit square.
pub fn heat_initial(mx: usize, my: usize) -> Vec<f64> {
    let mut u = Vec::with_capacity(mx * my);
    for j in 0..my {
        for i in 0..mx {
            let x = i as f64 / (mx as f64 - 1.0);
            let y = j as f64 / (my as f64 - 1.0);
            let r2 = (x - 0.5).powi(2) + (y - 0.5).powi(2);
            u.push((-30.0 * r2).exp());
        }
    }
    u
}

/// Implicit 1D reaction-diffusion residual over the stacked input `[u; udot]`:
/// `F_i = udot_i - (u_{i-1} - 2 u_i + u_{i+1}) + u_i^2`, zero Dirichlet ends.
pub fn reaction_diffusion<T: Scalar>(z: &[T]) -> Vec<T> {
    let n = z.len() / 2;
    let (u, udot) = z.split_at(n);
    let two = T::lit(2.0);
    (0..n)
        .map(|i| {
            let left = if i > 0 { u[i - 1] } else { T::zero() };
            let right = if i + 1 < n { u[i + 1] } else { T::zero() };
            udot[i] - (left - two * u[i] + right) + u[i] * u[i]
        })
        .collect()
}

/// Check every entry of `sparse` against `dense`, and that `dense` has no
/// entries off the sparse support.
pub fn assert_matches_dense(sparse: &SparseMatrix<f64>, dense: &[Vec<f64>], tol: f64) {
    assert_eq!(sparse.nrows(), dense.len());
    for (i, row) in dense.iter().enumerate() {
        assert_eq!(row.len(), sparse.ncols());
        for (j, &d) in row.iter().enumerate() {
            let s = sparse.get(i, j);
            assert!(
                (s - d).abs() < tol,
                "mismatch at ({}, {}): sparse={}, dense={}",
                i,
                j,
                s,
                d
            );
            if !sparse.pattern().contains(i, j) {
                assert_eq!(d, 0.0, "dense entry ({i}, {j}) outside the pattern");
            }
        }
    }
}
