//! Curve table command.

use clap::Args;
use diffuse_core::{Curve, CurveFamily, CurveShape, linear_to_db};

#[derive(Args)]
pub struct CurvesArgs {
    /// Shape to tabulate in detail (linear, poly, exp, sigmoid, sqrt, sinus)
    #[arg(value_parser = parse_shape)]
    shape: Option<CurveShape>,

    /// Shape parameter (defaults to a typical value for the shape)
    #[arg(short, long, allow_negative_numbers = true)]
    param: Option<f64>,

    /// Number of intervals between 0 and 1
    #[arg(long, default_value = "10")]
    steps: usize,
}

fn parse_shape(s: &str) -> Result<CurveShape, String> {
    s.parse().map_err(|_| {
        let names: Vec<&str> = CurveShape::ALL.iter().map(|shape| shape.name()).collect();
        format!("unknown shape '{s}' (expected one of: {})", names.join(", "))
    })
}

/// Parameter used when none is given.
fn typical_param(shape: CurveShape) -> f64 {
    match shape {
        CurveShape::Linear => 0.0,
        CurveShape::Poly => 2.0,
        CurveShape::Exp => Curve::DEFAULT_RAMP.param,
        CurveShape::Sigmoid => 3.0,
        CurveShape::Sqrt | CurveShape::Sinus => Curve::DEFAULT_XFADE.param,
    }
}

fn family_label(shape: CurveShape) -> &'static str {
    if shape.belongs_to(CurveFamily::Ramp) && shape.belongs_to(CurveFamily::Xfade) {
        "ramp, xfade"
    } else if shape.belongs_to(CurveFamily::Ramp) {
        "ramp"
    } else {
        "xfade"
    }
}

pub fn run(args: CurvesArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.steps > 0, "steps must be positive");
    match args.shape {
        Some(shape) => {
            let curve = Curve::new(shape, args.param.unwrap_or_else(|| typical_param(shape)));
            print_detail(curve, args.steps);
        }
        None => print_overview(args.steps),
    }
    Ok(())
}

fn print_detail(curve: Curve, steps: usize) {
    println!("Curve: {curve} [{}]", family_label(curve.shape));
    println!();
    println!("  {:>6}  {:>8}  {:>9}  {:>8}", "u", "A", "dB", "inverse");
    let resolved = curve.resolve();
    for i in 0..=steps {
        let u = i as f64 / steps as f64;
        let a = resolved.forward(u);
        println!(
            "  {u:6.3}  {a:8.5}  {:9.2}  {:8.5}",
            linear_to_db(a),
            resolved.inverse(a)
        );
    }
}

fn print_overview(steps: usize) {
    println!("Available Curves:");
    println!();
    for shape in CurveShape::ALL {
        println!(
            "  {:8} {:12} default param {}",
            shape.name(),
            family_label(shape),
            typical_param(shape)
        );
    }
    println!();

    let curves: Vec<Curve> = CurveShape::ALL
        .iter()
        .map(|&shape| Curve::new(shape, typical_param(shape)))
        .collect();
    print!("  {:>6}", "u");
    for curve in &curves {
        print!("  {:>8}", curve.shape.name());
    }
    println!();
    for i in 0..=steps {
        let u = i as f64 / steps as f64;
        print!("  {u:6.3}");
        for curve in &curves {
            print!("  {:8.5}", curve.forward(u));
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("sinus"), Ok(CurveShape::Sinus));
        let err = parse_shape("cubic").unwrap_err();
        assert!(err.contains("sigmoid"), "got: {err}");
    }

    #[test]
    fn test_typical_params_fit_their_family() {
        for shape in CurveShape::ALL {
            let curve = Curve::new(shape, typical_param(shape));
            assert!((curve.forward(1.0) - 1.0).abs() < 1e-12, "{curve}");
            assert!(curve.forward(0.5) > 0.0, "{curve}");
        }
    }

    #[test]
    fn test_family_labels() {
        assert_eq!(family_label(CurveShape::Linear), "ramp, xfade");
        assert_eq!(family_label(CurveShape::Exp), "ramp");
        assert_eq!(family_label(CurveShape::Sqrt), "xfade");
    }
}
