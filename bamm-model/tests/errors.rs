use bamm_compute::{
    discretise::{
        config::{DiscretisationConfig, DomainGeometry},
        error::MissingDiscretisation,
        SchemeKind,
    },
    symbolic::{
        div,
        error::{DomainMismatch, UnknownParameter},
        grad,
        Expr,
        ParameterValues,
    },
};
use bamm_model::{error::IllPosedModel, process, Model};

fn strip(report: String) -> String {
    String::from_utf8(strip_ansi_escapes::strip(report)).unwrap()
}

fn rod() -> DiscretisationConfig {
    DiscretisationConfig::empty()
        .with_region("rod", SchemeKind::FiniteVolume, 5, DomainGeometry::cartesian(0.0, 1.0))
}

fn diffusion(c: Expr, d: Expr) -> Model {
    let mut model = Model::new("diffusion");
    model.rhs.insert(c.clone(), div((d * grad(&c)).unwrap()).unwrap());
    model.initial_conditions.insert(c, Expr::scalar(0.0));
    model
}

#[test]
fn domain_mismatch_points_at_both_operands() {
    let c_n = Expr::variable("c_n", "negative electrode");
    let c_p = Expr::variable("c_p", "positive electrode");
    let err = (&c_n + &c_p).unwrap_err();
    assert!(err.is::<DomainMismatch>());

    let spans = err.spans.iter().map(|span| &err.source[span.clone()]).collect::<Vec<_>>();
    assert_eq!(spans, ["c_n", "c_p"]);

    let report = strip(err.report_to_string("model"));
    assert!(report.contains("cannot combine expressions defined on different domains"));
    assert!(report.contains("this operand is defined on [negative electrode]"));
    assert!(report.contains("this operand is defined on [positive electrode]"));
}

#[test]
fn unknown_parameters_are_reported_with_suggestions() {
    let model = diffusion(Expr::variable("c", "rod"), Expr::parameter("Diffusivity"));
    let values = [("Diffusivty", 1.0)].into_iter().collect::<ParameterValues>();
    let err = process(&model, &values, rod()).unwrap_err();

    let kind = err.downcast_ref::<UnknownParameter>().unwrap();
    assert_eq!(kind.name, "Diffusivity");
    assert_eq!(kind.suggestions, ["Diffusivty"]);
}

#[test]
fn domains_without_a_scheme() {
    let model = diffusion(Expr::variable("c", "separator"), Expr::scalar(1.0));
    let err = process(&model, &ParameterValues::new(), rod()).unwrap_err();
    assert_eq!(err.downcast_ref::<MissingDiscretisation>().unwrap().domain, "separator");
}

#[test]
fn ill_posed_models_are_rejected_before_processing() {
    let mut model = diffusion(Expr::variable("c", "rod"), Expr::scalar(1.0));
    model.initial_conditions.clear();
    let err = process(&model, &ParameterValues::new(), rod()).unwrap_err();
    assert!(err.is::<IllPosedModel>());

    let report = strip(err.report_to_string("model"));
    assert!(report.contains("`c` has no initial condition"));
}

#[test]
fn invalid_configurations() {
    let model = diffusion(Expr::variable("c", "rod"), Expr::scalar(1.0));
    let config = rod().with_mesh_points("rod", 1);
    assert!(process(&model, &ParameterValues::new(), config).is_err());
    assert!("finite-difference".parse::<SchemeKind>().is_err());
}
