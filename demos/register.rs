use kurbo::Point;
use stackreg::{
    AlignOutcome, AlignParams, Aligner, CancellationToken, ExprEvaluator, ImageStack, Plane,
    RegResult, RegistrationOpts, Rule, RuleBehavior, StackDims, TransformKind, register_stack,
};

/// Placeholder aligner: reports a zero shift and leaves pixels untouched.
/// Swap in a real registration backend to do actual work.
struct IdentityAligner;

impl Aligner for IdentityAligner {
    fn align(
        &self,
        source: &Plane,
        _reference: &Plane,
        _kind: TransformKind,
        _params: &AlignParams,
    ) -> RegResult<AlignOutcome> {
        Ok(AlignOutcome {
            source_points: vec![Point::new(0.0, 0.0)],
            target_points: vec![Point::new(0.0, 0.0)],
            transformed: source.clone(),
        })
    }

    fn apply_transform(
        &self,
        source: &Plane,
        _out_width: u32,
        _out_height: u32,
        _kind: TransformKind,
        _source_points: &[Point],
        _target_points: &[Point],
    ) -> RegResult<Plane> {
        Ok(source.clone())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let dims = StackDims::new(2, 1, 3)?;
    let input = ImageStack::filled(64, 64, dims, 0.0);
    let reference = ImageStack::filled(64, 64, dims, 0.0);

    let opts = RegistrationOpts {
        rules: vec![
            // Channel 0 is aligned against the reference directly.
            Rule {
                condition: "c == 0".into(),
                ..Rule::default()
            },
            // Channel 1 reuses the transform computed for channel 0.
            Rule {
                condition: "c == 1".into(),
                reference_channel: "0".into(),
                reference_depth: "z".into(),
                reference_time: "t".into(),
                behavior: RuleBehavior::UseTransformation,
            },
        ],
        ..RegistrationOpts::default()
    };

    let out = register_stack(
        &input,
        &reference,
        &opts,
        &ExprEvaluator,
        &IdentityAligner,
        &CancellationToken::new(),
    )?;

    println!("{}", out.log.to_pretty_json()?);
    Ok(())
}
