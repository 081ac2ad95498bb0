mod fan_out_tests;
