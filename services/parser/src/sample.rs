//! Built-in demo sheet

use crate::cell::{Cell, Grid};

pub const SAMPLE_CSV: &str = "主力商品名,前年,予定,実績
バターフィナンシェ4入り,2454,1820,1726
バターフィナンシェ8入り,,2800,2346
バターフィナンシェ12入り,1539,1260,1317
バターフィナンシェ16入り,1060,980,1180
バターカレット9入り,344,140,123
アソート(カステラ),,1400,1433
セレ16(14),1277,1400,1245
バターキャラメルポット,497,140,150
バターバイヤモンド(ショコラ),936,980,1138
抹茶フィナンシェ,1468,1400,871
レモンケーキ,798,1680,1575
";

const SAMPLE_ROWS: &[(&str, Option<f64>, f64, f64)] = &[
    ("バターフィナンシェ4入り", Some(2454.0), 1820.0, 1726.0),
    ("バターフィナンシェ8入り", None, 2800.0, 2346.0),
    ("バターフィナンシェ12入り", Some(1539.0), 1260.0, 1317.0),
    ("バターフィナンシェ16入り", Some(1060.0), 980.0, 1180.0),
    ("バターカレット9入り", Some(344.0), 140.0, 123.0),
    ("アソート(カステラ)", None, 1400.0, 1433.0),
    ("セレ16(14)", Some(1277.0), 1400.0, 1245.0),
    ("バターキャラメルポット", Some(497.0), 140.0, 150.0),
    ("バターバイヤモンド(ショコラ)", Some(936.0), 980.0, 1138.0),
    ("抹茶フィナンシェ", Some(1468.0), 1400.0, 871.0),
    ("レモンケーキ", Some(798.0), 1680.0, 1575.0),
];

/// The demo sheet as a decoded spreadsheet would deliver it: numbers as numbers.
pub fn sample_grid() -> Grid {
    let header = ["主力商品名", "前年", "予定", "実績"].map(Cell::from).to_vec();

    std::iter::once(header)
        .chain(SAMPLE_ROWS.iter().map(|&(product, last_year, target, actual)| {
            vec![
                Cell::from(product),
                last_year.map_or(Cell::Empty, Cell::Number),
                Cell::Number(target),
                Cell::Number(actual),
            ]
        }))
        .collect()
}
