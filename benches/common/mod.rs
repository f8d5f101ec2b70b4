#![allow(dead_code)]

use jacolor::{Grid2d, Scalar};

// ─── Heat equation ─────────────────────────────────────────────────────────
// u_t = u_xx + u_yy on the unit square, five-point stencil, u = f(u) on the
// boundary.

pub fn heat_rhs<T: Scalar>(u: &[T], mx: usize, my: usize) -> Vec<T> {
    let grid = match Grid2d::from_vec((0, 0), mx, my, u.to_vec()) {
        Ok(g) => g,
        Err(e) => panic!("heat_rhs: {e}"),
    };
    let sx = T::lit(((mx - 1) * (mx - 1)) as f64);
    let sy = T::lit(((my - 1) * (my - 1)) as f64);
    let two = T::lit(2.0);
    let (mx, my) = (mx as isize, my as isize);
    grid.indices()
        .map(|(i, j)| {
            let c = grid[(i, j)];
            if i == 0 || j == 0 || i == mx - 1 || j == my - 1 {
                c
            } else {
                (grid[(i - 1, j)] + grid[(i + 1, j)] - two * c) * sx
                    + (grid[(i, j - 1)] + grid[(i, j + 1)] - two * c) * sy
            }
        })
        .collect()
}

pub fn heat_initial(mx: usize, my: usize) -> Vec<f64> {
    let mut u = Vec::with_capacity(mx * my);
    for j in 0..my {
        for i in 0..mx {
            let x = i as f64 / (mx - 1) as f64 - 0.5;
            let y = j as f64 / (my - 1) as f64 - 0.5;
            u.push((-30.0 * (x * x + y * y)).exp());
        }
    }
    u
}

// ─── Gray-Scott ────────────────────────────────────────────────────────────
// Implicit residual F(z, zdot) = zdot - D lap(z) - R(z) for two interleaved
// species on a periodic grid, traced over the stacked input [z; zdot].

pub fn gray_scott<T: Scalar>(stacked: &[T], m: usize) -> Vec<T> {
    let n = 2 * m * m;
    let (z, zdot) = stacked.split_at(n);
    let (du, dv) = (T::lit(2e-5), T::lit(1e-5));
    let (feed, kill) = (T::lit(0.04), T::lit(0.06));
    let h2 = T::lit(((m * m) as f64).recip());
    let one = T::lit(1.0);
    let four = T::lit(4.0);
    let at = |i: usize, j: usize, s: usize| z[2 * ((j % m) * m + (i % m)) + s];

    let mut out = Vec::with_capacity(n);
    for j in 0..m {
        for i in 0..m {
            let lap = |s: usize| {
                (at(i + m - 1, j, s) + at(i + 1, j, s) + at(i, j + m - 1, s) + at(i, j + 1, s)
                    - four * at(i, j, s))
                    / h2
            };
            let (u, v) = (at(i, j, 0), at(i, j, 1));
            let uvv = u * v * v;
            let k = 2 * (j * m + i);
            out.push(zdot[k] - du * lap(0) + uvv - feed * (one - u));
            out.push(zdot[k + 1] - dv * lap(1) - uvv + (feed + kill) * v);
        }
    }
    out
}

pub fn gray_scott_state(m: usize) -> (Vec<f64>, Vec<f64>) {
    let mut z = Vec::with_capacity(2 * m * m);
    for j in 0..m {
        for i in 0..m {
            let x = i as f64 / m as f64;
            let y = j as f64 / m as f64;
            let bump = (-40.0 * ((x - 0.5).powi(2) + (y - 0.5).powi(2))).exp();
            z.push(1.0 - 0.5 * bump);
            z.push(0.25 * bump);
        }
    }
    (z, vec![0.0; 2 * m * m])
}
