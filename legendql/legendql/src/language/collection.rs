use legendql_sql::ast::AggregateFunction;

use super::expr::Expr;
use super::operators::Operator;
use super::{Primitive, PrimitiveType};
use crate::{Error, Result};

/// The values of one group, as handed to an aggregation closure.
///
/// Wraps the per-row value produced by the mapping closure; every aggregate
/// reduces it to a single [Primitive].
#[derive(Debug, Clone)]
pub struct Collection {
    mapped: Primitive,
}

impl Collection {
    pub(crate) fn new(mapped: Primitive) -> Self {
        Collection { mapped }
    }

    /// Type of the values being aggregated.
    pub fn element_type(&self) -> PrimitiveType {
        self.mapped.primitive_type()
    }

    fn aggregate(&self, function: AggregateFunction, ty: PrimitiveType) -> Primitive {
        let values = Expr::Collection(Box::new(self.mapped.expr.clone()));
        Primitive::new(
            ty,
            Expr::operation(Operator::Aggregate(function), vec![values]),
        )
    }

    fn numeric(&self, function: AggregateFunction, ty: PrimitiveType) -> Result<Primitive> {
        let element = self.element_type();
        if !element.is_numeric() {
            return Err(Error::type_mismatch(format!(
                "{function} aggregation expects numeric values, got {element}"
            )));
        }
        Ok(self.aggregate(function, ty))
    }

    pub fn count(&self) -> Primitive {
        self.aggregate(AggregateFunction::Count, PrimitiveType::Integer)
    }

    pub fn distinct_count(&self) -> Primitive {
        self.aggregate(AggregateFunction::DistinctCount, PrimitiveType::Integer)
    }

    pub fn average(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::Average, PrimitiveType::Float)
    }

    pub fn sum(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::Sum, self.element_type())
    }

    pub fn max(&self) -> Result<Primitive> {
        self.ordered(AggregateFunction::Max)
    }

    pub fn min(&self) -> Result<Primitive> {
        self.ordered(AggregateFunction::Min)
    }

    fn ordered(&self, function: AggregateFunction) -> Result<Primitive> {
        let element = self.element_type();
        if element == PrimitiveType::Boolean {
            return Err(Error::type_mismatch(format!(
                "{function} aggregation expects ordered values, got {element}"
            )));
        }
        Ok(self.aggregate(function, element))
    }

    pub fn std_dev_sample(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::StdDevSample, PrimitiveType::Float)
    }

    pub fn std_dev_population(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::StdDevPopulation, PrimitiveType::Float)
    }

    pub fn variance_sample(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::VarianceSample, PrimitiveType::Float)
    }

    pub fn variance_population(&self) -> Result<Primitive> {
        self.numeric(AggregateFunction::VariancePopulation, PrimitiveType::Float)
    }

    /// Concatenates the string values of the group, separated by `separator`.
    pub fn join_strings(&self, separator: &str) -> Result<Primitive> {
        let element = self.element_type();
        if element != PrimitiveType::String {
            return Err(Error::type_mismatch(format!(
                "joinStrings expects String values, got {element}"
            )));
        }
        let values = Expr::Collection(Box::new(self.mapped.expr.clone()));
        let separator = Primitive::from(separator).expr;
        Ok(Primitive::new(
            PrimitiveType::String,
            Expr::operation(Operator::JoinStrings, vec![values, separator]),
        ))
    }
}
