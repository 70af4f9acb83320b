pub mod landmark_predictor;
