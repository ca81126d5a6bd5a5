//! Static unit tables.
//!
//! The first entry of every table is the base unit (factor 1). A factor says
//! how many of that unit make one base unit.

/// One unit of a dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSpec {
    pub code: &'static str,
    pub factor: f64,
    pub label: &'static str,
}

const fn unit(code: &'static str, factor: f64, label: &'static str) -> UnitSpec {
    UnitSpec {
        code,
        factor,
        label,
    }
}

pub(crate) static LENGTH: &[UnitSpec] = &[
    unit("m", 1.0, "Meters"),
    unit("km", 0.001, "Kilometers"),
    unit("cm", 100.0, "Centimeters"),
    unit("mm", 1000.0, "Millimeters"),
    unit("in", 1.0 / 0.0254, "Inches"),
    unit("ft", 1.0 / 0.3048, "Feet"),
    unit("yd", 1.0 / 0.9144, "Yards"),
    unit("mi", 1.0 / 1609.344, "Miles"),
    unit("nmi", 1.0 / 1852.0, "Nautical miles"),
];

pub(crate) static AREA: &[UnitSpec] = &[
    unit("m2", 1.0, "Square meters"),
    unit("km2", 1e-6, "Square kilometers"),
    unit("cm2", 1e4, "Square centimeters"),
    unit("mm2", 1e6, "Square millimeters"),
    unit("ha", 1e-4, "Hectares"),
    unit("ac", 1.0 / 4046.8564224, "Acres"),
    unit("in2", 1.0 / 0.00064516, "Square inches"),
    unit("ft2", 1.0 / 0.09290304, "Square feet"),
    unit("yd2", 1.0 / 0.83612736, "Square yards"),
    unit("mi2", 1.0 / 2_589_988.110336, "Square miles"),
];

pub(crate) static VOLUME: &[UnitSpec] = &[
    unit("l", 1.0, "Liters"),
    unit("ml", 1000.0, "Milliliters"),
    unit("m3", 0.001, "Cubic meters"),
    unit("cm3", 1000.0, "Cubic centimeters"),
    unit("gal", 1.0 / 3.785411784, "Gallons (US)"),
    unit("qt", 1.0 / 0.946352946, "Quarts (US)"),
    unit("pt", 1.0 / 0.473176473, "Pints (US)"),
    unit("cup", 1.0 / 0.2365882365, "Cups (US)"),
    unit("floz", 1.0 / 0.0295735295625, "Fluid ounces (US)"),
    unit("in3", 1.0 / 0.016387064, "Cubic inches"),
    unit("ft3", 1.0 / 28.316846592, "Cubic feet"),
];

pub(crate) static WEIGHT: &[UnitSpec] = &[
    unit("kg", 1.0, "Kilograms"),
    unit("g", 1000.0, "Grams"),
    unit("mg", 1e6, "Milligrams"),
    unit("t", 0.001, "Metric tons"),
    unit("lb", 1.0 / 0.45359237, "Pounds"),
    unit("oz", 1.0 / 0.028349523125, "Ounces"),
    unit("st", 1.0 / 6.35029318, "Stones"),
];

pub(crate) static TIME: &[UnitSpec] = &[
    unit("s", 1.0, "Seconds"),
    unit("ms", 1000.0, "Milliseconds"),
    unit("min", 1.0 / 60.0, "Minutes"),
    unit("h", 1.0 / 3600.0, "Hours"),
    unit("d", 1.0 / 86_400.0, "Days"),
    unit("wk", 1.0 / 604_800.0, "Weeks"),
];

// Factors are unused for temperature; conversion goes through formulas.
pub(crate) static TEMPERATURE: &[UnitSpec] = &[
    unit("C", 1.0, "Celsius"),
    unit("F", 1.0, "Fahrenheit"),
    unit("K", 1.0, "Kelvin"),
];

pub(crate) static ANGLE: &[UnitSpec] = &[
    unit("deg", 1.0, "Degrees"),
    unit("rad", std::f64::consts::PI / 180.0, "Radians"),
    unit("grad", 400.0 / 360.0, "Gradians"),
    unit("arcmin", 60.0, "Arcminutes"),
    unit("arcsec", 3600.0, "Arcseconds"),
    unit("turn", 1.0 / 360.0, "Turns"),
];
