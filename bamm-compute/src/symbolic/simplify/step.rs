/// Possible simplification steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An operator applied to constant operands is replaced by its value.
    ///
    /// `2*3 = 6`
    /// `exp(0) = 1`
    /// `matrix @ vector = vector`
    FoldConstant,

    /// `0+a = a`
    /// `a+0 = a`
    /// `a-0 = a`
    AddZero,

    /// `0-a = -a`
    SubtractFromZero,

    /// `--a = a`
    DoubleNegation,

    /// `0*a = 0`
    /// `a*0 = 0`
    /// `0/a = 0`
    MultiplyZero,

    /// `1*a = a`
    /// `a*1 = a`
    /// `a/1 = a`
    MultiplyOne,

    /// `a^0 = 1`
    PowerZero,

    /// `a^1 = a`
    PowerOne,

    /// `a+(b+c) = a+b+c`
    FlattenSum,

    /// `a+2+b+3 = a+b+5`
    CombineConstantTerms,
}
