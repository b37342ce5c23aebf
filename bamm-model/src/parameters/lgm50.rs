//! The LG M50 cell (graphite / NMC 811), as parameterised by Chen et al. (2020), with the
//! electrolyte transport fits of Nyman et al. (2008).
//!
//! # References
//!
//! - C.-H. Chen, F. Brosa Planella, K. O'Regan, D. Gastol, W. D. Widanage and E. Kendrick,
//!   "Development of Experimental Techniques for Parameterization of Multi-scale Lithium-ion
//!   Battery Models", Journal of the Electrochemical Society 167 (2020) 080534.
//! - A. Nyman, M. Behm and G. Lindbergh, "Electrochemical characterisation and modelling of the
//!   mass transport phenomena in LiPF6-EC-EMC electrolyte", Electrochimica Acta 53 (2008)
//!   6356-6365.

use bamm_compute::{
    consts::GAS_CONSTANT,
    symbolic::{exp, tanh, Expr, ParameterValue, ParameterValues},
};
use bamm_error::Error;
use super::arguments;

pub const ELECTROLYTE_DIFFUSIVITY: &str = "Electrolyte diffusivity [m2.s-1]";
pub const ELECTROLYTE_CONDUCTIVITY: &str = "Electrolyte conductivity [S.m-1]";
pub const NEGATIVE_EXCHANGE_CURRENT_DENSITY: &str = "Negative electrode exchange-current density [A.m-2]";
pub const POSITIVE_EXCHANGE_CURRENT_DENSITY: &str = "Positive electrode exchange-current density [A.m-2]";
pub const NEGATIVE_OCP: &str = "Negative electrode OCP [V]";
pub const POSITIVE_OCP: &str = "Positive electrode OCP [V]";

const NEGATIVE_MAX_CONCENTRATION: &str = "Maximum concentration in negative electrode [mol.m-3]";
const POSITIVE_MAX_CONCENTRATION: &str = "Maximum concentration in positive electrode [mol.m-3]";

/// Temperature of the Arrhenius reference state, in K.
const ARRHENIUS_REFERENCE: f64 = 298.15;

/// Diffusivity of LiPF6 in EC:EMC (3:7), as a function of the electrolyte concentration `c_e` and
/// the temperature `T`. The fit has no temperature dependence.
fn electrolyte_diffusivity(args: &[Expr]) -> Result<Expr, Error> {
    let [c_e, _] = arguments(ELECTROLYTE_DIFFUSIVITY, args)?;
    let x = (c_e / 1000.0)?;
    Expr::sum(vec![
        (8.794e-11 * x.pow(2.0)?)?,
        (-3.972e-10 * &x)?,
        Expr::scalar(4.862e-10),
    ])
}

/// Conductivity of LiPF6 in EC:EMC (3:7), as a function of the electrolyte concentration `c_e`
/// and the temperature `T`. The fit has no temperature dependence.
fn electrolyte_conductivity(args: &[Expr]) -> Result<Expr, Error> {
    let [c_e, _] = arguments(ELECTROLYTE_CONDUCTIVITY, args)?;
    let x = (c_e / 1000.0)?;
    Expr::sum(vec![
        (0.1297 * x.pow(3.0)?)?,
        (-2.51 * x.pow(1.5)?)?,
        (3.329 * &x)?,
    ])
}

/// `m_ref * exp(E_r / R * (1 / T_ref - 1 / T)) * sqrt(c_e * c_s * (c_max - c_s))`, the
/// exchange-current density of a Butler-Volmer reaction.
fn exchange_current_density(
    name: &str,
    m_ref: f64,
    activation_energy: f64,
    max_concentration: &str,
    args: &[Expr],
) -> Result<Expr, Error> {
    let [c_e, c_s_surf, temperature] = arguments(name, args)?;
    let c_max = Expr::parameter(max_concentration);
    let arrhenius = exp(
        activation_energy / GAS_CONSTANT * (1.0 / ARRHENIUS_REFERENCE - (1.0 / temperature)?)?,
    )?;
    let rate = (m_ref * arrhenius)?;
    let concentrations = ((c_e.pow(0.5)? * c_s_surf.pow(0.5)?)? * (c_max - &c_s_surf)?.pow(0.5)?)?;
    rate * concentrations
}

/// `amplitude * tanh(steepness * (sto - centre))`.
fn step(amplitude: f64, steepness: f64, sto: &Expr, centre: f64) -> Result<Expr, Error> {
    amplitude * tanh(steepness * (sto - centre)?)?
}

/// Open-circuit potential of LG M50 graphite, as a function of the stoichiometry.
fn graphite_ocp(args: &[Expr]) -> Result<Expr, Error> {
    let [sto] = arguments(NEGATIVE_OCP, args)?;
    Expr::sum(vec![
        (1.9793 * exp((-39.3631 * &sto)?)?)?,
        Expr::scalar(0.2482),
        step(-0.0909, 29.8538, &sto, 0.1234)?,
        step(-0.04478, 14.9159, &sto, 0.2769)?,
        step(-0.0205, 30.4444, &sto, 0.6103)?,
    ])
}

/// Open-circuit potential of LG M50 NMC 811, as a function of the stoichiometry.
fn nmc_ocp(args: &[Expr]) -> Result<Expr, Error> {
    let [sto] = arguments(POSITIVE_OCP, args)?;
    Expr::sum(vec![
        (-0.8090 * &sto)?,
        Expr::scalar(4.4875),
        step(-0.0428, 18.5138, &sto, 0.5542)?,
        step(-17.7326, 15.7890, &sto, 0.3117)?,
        step(17.5842, 15.9308, &sto, 0.3120)?,
    ])
}

/// The LG M50 parameter set.
///
/// Concentration-dependent properties are function parameters:
///
/// | name | arguments |
/// | ---- | --------- |
/// | [`ELECTROLYTE_DIFFUSIVITY`], [`ELECTROLYTE_CONDUCTIVITY`] | `c_e`, `T` |
/// | [`NEGATIVE_EXCHANGE_CURRENT_DENSITY`], [`POSITIVE_EXCHANGE_CURRENT_DENSITY`] | `c_e`, `c_s_surf`, `T` |
/// | [`NEGATIVE_OCP`], [`POSITIVE_OCP`] | stoichiometry |
pub fn lgm50() -> ParameterValues {
    let mut values = [
        ("1 + dlnf/dlnc", 1.0),
        ("Ambient temperature [K]", 298.15),
        ("Cation transference number", 0.2594),
        ("Cell cooling surface area [m2]", 0.0046),
        ("Cell volume [m3]", 2.42e-05),
        ("Current function [A]", 5.0),
        ("Electrode height [m]", 0.065),
        ("Electrode width [m]", 1.58),
        ("Initial concentration in electrolyte [mol.m-3]", 1000.0),
        ("Initial concentration in negative electrode [mol.m-3]", 29866.0),
        ("Initial concentration in positive electrode [mol.m-3]", 17038.0),
        ("Initial temperature [K]", 298.15),
        ("Lower voltage cut-off [V]", 2.5),
        (NEGATIVE_MAX_CONCENTRATION, 33133.0),
        (POSITIVE_MAX_CONCENTRATION, 63104.0),
        ("Negative current collector conductivity [S.m-1]", 58411000.0),
        ("Negative current collector density [kg.m-3]", 8960.0),
        ("Negative current collector specific heat capacity [J.kg-1.K-1]", 620.7659832284165),
        ("Negative current collector thermal conductivity [W.m-1.K-1]", 401.0),
        ("Negative current collector thickness [m]", 1.2e-05),
        ("Negative electrode active material volume fraction", 0.75),
        ("Negative electrode Bruggeman coefficient (electrode)", 1.5),
        ("Negative electrode Bruggeman coefficient (electrolyte)", 1.5),
        ("Negative electrode conductivity [S.m-1]", 215.0),
        ("Negative electrode density [kg.m-3]", 1657.0),
        ("Negative electrode diffusivity [m2.s-1]", 3.3e-14),
        ("Negative electrode electrons in reaction", 1.0),
        ("Negative electrode OCP entropic change [V.K-1]", 0.0),
        ("Negative electrode porosity", 0.25),
        ("Negative electrode specific heat capacity [J.kg-1.K-1]", 1128.6654240516666),
        ("Negative electrode thermal conductivity [W.m-1.K-1]", 1.7),
        ("Negative electrode thickness [m]", 8.52e-05),
        ("Negative particle radius [m]", 5.86e-06),
        ("Nominal cell capacity [A.h]", 5.0),
        ("Number of cells connected in series to make a battery", 1.0),
        ("Number of electrodes connected in parallel to make a cell", 1.0),
        ("Positive current collector conductivity [S.m-1]", 36914000.0),
        ("Positive current collector density [kg.m-3]", 2700.0),
        ("Positive current collector specific heat capacity [J.kg-1.K-1]", 1446.3041219633499),
        ("Positive current collector thermal conductivity [W.m-1.K-1]", 237.0),
        ("Positive current collector thickness [m]", 1.6e-05),
        ("Positive electrode active material volume fraction", 0.665),
        ("Positive electrode Bruggeman coefficient (electrode)", 1.5),
        ("Positive electrode Bruggeman coefficient (electrolyte)", 1.5),
        ("Positive electrode conductivity [S.m-1]", 0.18),
        ("Positive electrode density [kg.m-3]", 3262.0),
        ("Positive electrode diffusivity [m2.s-1]", 4e-15),
        ("Positive electrode electrons in reaction", 1.0),
        ("Positive electrode OCP entropic change [V.K-1]", 0.0),
        ("Positive electrode porosity", 0.335),
        ("Positive electrode specific heat capacity [J.kg-1.K-1]", 1128.6654240516666),
        ("Positive electrode thermal conductivity [W.m-1.K-1]", 2.1),
        ("Positive electrode thickness [m]", 7.56e-05),
        ("Positive particle radius [m]", 5.22e-06),
        ("Reference temperature [K]", 298.15),
        ("Separator Bruggeman coefficient (electrolyte)", 1.5),
        ("Separator density [kg.m-3]", 397.0),
        ("Separator porosity", 0.47),
        ("Separator specific heat capacity [J.kg-1.K-1]", 1128.6654240516666),
        ("Separator thermal conductivity [W.m-1.K-1]", 0.16),
        ("Separator thickness [m]", 1.2e-05),
        ("Total heat transfer coefficient [W.m-2.K-1]", 35.0),
        ("Typical current [A]", 5.0),
        ("Typical electrolyte concentration [mol.m-3]", 1000.0),
        ("Upper voltage cut-off [V]", 4.4),
    ].into_iter().collect::<ParameterValues>();

    values.update([
        (ELECTROLYTE_DIFFUSIVITY, ParameterValue::function(electrolyte_diffusivity)),
        (ELECTROLYTE_CONDUCTIVITY, ParameterValue::function(electrolyte_conductivity)),
        (NEGATIVE_EXCHANGE_CURRENT_DENSITY, ParameterValue::function(|args: &[Expr]| {
            exchange_current_density(NEGATIVE_EXCHANGE_CURRENT_DENSITY, 6.48e-7, 35000.0, NEGATIVE_MAX_CONCENTRATION, args)
        })),
        (POSITIVE_EXCHANGE_CURRENT_DENSITY, ParameterValue::function(|args: &[Expr]| {
            exchange_current_density(POSITIVE_EXCHANGE_CURRENT_DENSITY, 3.42e-6, 17800.0, POSITIVE_MAX_CONCENTRATION, args)
        })),
        (NEGATIVE_OCP, ParameterValue::function(graphite_ocp)),
        (POSITIVE_OCP, ParameterValue::function(nmc_ocp)),
    ]);
    values
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{afe_is_relative_eq, afe_relative_error_msg, afe_abs, assert_float_relative_eq};
    use bamm_compute::{
        numerical::Eval,
        symbolic::{substitute, ExprKind},
    };
    use crate::error::ArgumentCount;
    use super::*;

    /// Substitutes the function parameter `name` applied to numbers, and evaluates it.
    fn evaluate(name: &str, args: &[f64]) -> f64 {
        let args = args.iter().map(|&arg| Expr::scalar(arg)).collect();
        let expr = Expr::function_parameter(name, args).unwrap();
        let substituted = substitute(&expr, &lgm50()).unwrap();
        assert!(!substituted.any(|e| matches!(
            e.kind(),
            ExprKind::Parameter(_) | ExprKind::FunctionParameter(..),
        )));
        substituted.eval_default().unwrap().as_scalar().unwrap()
    }

    #[test]
    fn electrolyte_transport() {
        assert_float_relative_eq!(evaluate(ELECTROLYTE_DIFFUSIVITY, &[1000.0, 298.15]), 1.7694e-10, 1e-12);
        assert_float_relative_eq!(evaluate(ELECTROLYTE_CONDUCTIVITY, &[1000.0, 298.15]), 0.9487, 1e-12);
    }

    #[test]
    fn exchange_current_density_at_reference_temperature() {
        let expected = 6.48e-7 * (1000.0f64 * 20000.0 * (33133.0 - 20000.0)).sqrt();
        let actual = evaluate(NEGATIVE_EXCHANGE_CURRENT_DENSITY, &[1000.0, 20000.0, 298.15]);
        assert_float_relative_eq!(actual, expected, 1e-9);
    }

    #[test]
    fn exchange_current_density_grows_with_temperature() {
        let cold = evaluate(POSITIVE_EXCHANGE_CURRENT_DENSITY, &[1000.0, 30000.0, 288.15]);
        let warm = evaluate(POSITIVE_EXCHANGE_CURRENT_DENSITY, &[1000.0, 30000.0, 308.15]);
        assert!(warm > cold);
    }

    #[test]
    fn open_circuit_potentials() {
        let graphite = [0.1, 0.3, 0.5, 0.7, 0.9].map(|sto| evaluate(NEGATIVE_OCP, &[sto]));
        assert!(graphite.windows(2).all(|w| w[1] < w[0]));
        assert!(graphite.iter().all(|u| (0.0..1.0).contains(u)));

        let nmc = evaluate(POSITIVE_OCP, &[0.5]);
        assert!((3.5..4.3).contains(&nmc));
    }

    #[test]
    fn wrong_number_of_arguments() {
        let expr = Expr::function_parameter(NEGATIVE_OCP, vec![Expr::scalar(0.1), Expr::scalar(0.2)]).unwrap();
        let err = substitute(&expr, &lgm50()).unwrap_err();
        let kind = err.downcast_ref::<ArgumentCount>().unwrap();
        assert_eq!((kind.expected, kind.given), (1, 2));
    }

    #[test]
    fn search_by_keyword() {
        let values = lgm50();
        let radii = values.search("particle radius");
        assert_eq!(radii.len(), 2);
        assert!(values.contains(ELECTROLYTE_DIFFUSIVITY));
    }
}
