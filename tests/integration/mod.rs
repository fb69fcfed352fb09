mod ranking_engine;
