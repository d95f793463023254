pub mod mapbox;
