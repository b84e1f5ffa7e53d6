//! Symmetric quadrature rules on the reference tetrahedron
//! `{x, y, z >= 0, x + y + z <= 1}`.

use super::TetRule;

/// Centroid rule, exact for linear polynomials.
pub const TET_1: TetRule = TetRule {
    points: &[[0.25, 0.25, 0.25]],
    weights: &[1.0],
};

const A4: f64 = 0.138_196_601_125_010_5;
const B4: f64 = 1.0 - 3.0 * A4;

/// Four-point rule, exact for quadratic polynomials.
pub const TET_4: TetRule = TetRule {
    points: &[
        [A4, A4, A4],
        [B4, A4, A4],
        [A4, B4, A4],
        [A4, A4, B4],
    ],
    weights: &[0.25, 0.25, 0.25, 0.25],
};

const A1: f64 = 0.310_885_919_263_300_609_797_345_733_763_457_8;
const B1: f64 = 1.0 - 3.0 * A1;
const W1: f64 = 0.112_687_925_718_015_850_799_185_652_333_286_3;

const A2: f64 = 0.092_735_250_310_891_226_402_323_913_737_030_6;
const B2: f64 = 1.0 - 3.0 * A2;
const W2: f64 = 0.073_493_043_116_361_949_543_710_205_486_327_5;

const A3: f64 = 0.045_503_704_125_649_649_491_880_526_279_339_4;
const B3: f64 = 0.5 - A3;
const W3: f64 = 0.042_546_020_777_081_466_438_069_428_120_257_4;

/// Fourteen-point rule, exact for polynomials of degree 5.
pub const TET_14: TetRule = TetRule {
    points: &[
        [A1, A1, A1],
        [B1, A1, A1],
        [A1, B1, A1],
        [A1, A1, B1],
        [A2, A2, A2],
        [B2, A2, A2],
        [A2, B2, A2],
        [A2, A2, B2],
        [A3, A3, B3],
        [A3, B3, A3],
        [B3, A3, A3],
        [A3, B3, B3],
        [B3, A3, B3],
        [B3, B3, A3],
    ],
    weights: &[W1, W1, W1, W1, W2, W2, W2, W2, W3, W3, W3, W3, W3, W3],
};
