//! The three deployed pages and their feature schemas

use super::{Feature, FeatureSchema, ModelPage, TaskKind};
use crate::error::Result;

pub const WHEAT_SEEDS: &str = "wheat_seeds";
pub const USED_CAR: &str = "used_car";
pub const MELBOURNE_HOUSING: &str = "melbourne_housing";

pub(super) fn pages() -> Result<Vec<ModelPage>> {
    Ok(vec![wheat_seeds()?, used_car()?, melbourne_housing()?])
}

fn wheat_seeds() -> Result<ModelPage> {
    let schema = FeatureSchema::new(vec![
        Feature::numeric("Area", 15.26),
        Feature::numeric("Compactness", 0.871),
        Feature::numeric("Length", 5.763),
        Feature::numeric("AsymmetryCoeff", 2.221),
        Feature::numeric("Groove", 5.22),
    ])?;

    Ok(ModelPage {
        id: WHEAT_SEEDS.to_string(),
        title: "Wheat Seeds Variety Classifier".to_string(),
        task: TaskKind::Classification,
        artifact: "wheat_seeds".to_string(),
        download_name: "wheat_predictions.csv".to_string(),
        schema,
    })
}

// Price is the training target and never an input.
fn used_car() -> Result<ModelPage> {
    let schema = FeatureSchema::new(vec![
        Feature::numeric("Year", 2015.0),
        Feature::numeric("Age", 5.0),
        Feature::numeric("Kilometers_Driven", 50000.0),
        Feature::numeric("Log_Km", 10.82),
        Feature::numeric("Mileage", 15.0),
        Feature::numeric("Engine", 1200.0),
        Feature::numeric("Power", 90.0),
        Feature::numeric("Seats", 5.0),
        Feature::categorical("Fuel_Type", "Petrol"),
        Feature::categorical("Transmission", "Manual"),
        Feature::categorical("Owner_Type", "First"),
        Feature::categorical("Location", "Mumbai"),
        Feature::categorical("Brand_Model", "Maruti Alto"),
        Feature::categorical("Brand", "Maruti"),
    ])?;

    Ok(ModelPage {
        id: USED_CAR.to_string(),
        title: "Used Car Price Predictor".to_string(),
        task: TaskKind::Regression,
        artifact: "usedcar_price_model".to_string(),
        download_name: "usedcar_predictions.csv".to_string(),
        schema,
    })
}

fn melbourne_housing() -> Result<ModelPage> {
    let schema = FeatureSchema::new(vec![
        Feature::numeric("Rooms", 3.0),
        Feature::categorical("Property_Type", "t"),
        Feature::categorical("Sale_Method", "PI"),
        Feature::numeric("Distance_to_CBD_km", 13.5),
        Feature::numeric("Parking_Spaces", 1.0),
        Feature::numeric("Land_Size", 303.0),
        Feature::numeric("Building_Size", 225.0),
        Feature::categorical("Governing_Council", "Moonee Valley"),
        Feature::numeric("Latitude", -37.718),
        Feature::numeric("Longitude", 144.878),
        Feature::categorical("Region", "Western Metropolitan"),
        // sale year minus year built
        Feature::numeric("Property_Age", 7.0),
    ])?;

    Ok(ModelPage {
        id: MELBOURNE_HOUSING.to_string(),
        title: "Melbourne Housing Price Estimator".to_string(),
        task: TaskKind::Regression,
        artifact: "melbourne_housing_model".to_string(),
        download_name: "melbourne_predictions.csv".to_string(),
        schema,
    })
}
